// src/indicators.rs
//! Rolling statistics over a [`BarSeries`].
//!
//! Every function returns a series aligned with its input. Positions without
//! enough history hold `NaN`; strategies read them through [`IndicatorSet`],
//! which turns `NaN` into `None` so a short series means "no signal".

use crate::types::BarSeries;
use std::collections::BTreeMap;
use std::fmt;
use ta::indicators::{Maximum, MovingAverageConvergenceDivergence, SimpleMovingAverage};
use ta::Next;

/// Bars the "52-week high" looks back over.
pub const YEAR_BARS: usize = 250;

fn undefined(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

/// Feeds `values` through `step`, masking the first `warmup - 1` outputs.
fn warmed<F: FnMut(f64) -> f64>(values: &[f64], warmup: usize, mut step: F) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(idx, &value)| {
            let out = step(value);
            if idx + 1 < warmup {
                f64::NAN
            } else {
                out
            }
        })
        .collect()
}

/// Simple moving average over `window` values.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    let Ok(mut average) = SimpleMovingAverage::new(window) else {
        return undefined(values.len());
    };
    warmed(values, window, |v| average.next(v))
}

/// Maximum over the trailing `window` values, or over everything seen so far
/// while fewer than `window` values exist.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let Ok(mut maximum) = Maximum::new(window) else {
        return undefined(values.len());
    };
    values.iter().map(|&v| maximum.next(v)).collect()
}

/// Wilder RSI on a 0-100 scale. Seeded with the plain mean of the first
/// `window` changes, so the first defined value sits at index `window`.
pub fn rsi(closes: &[f64], window: usize) -> Vec<f64> {
    let mut out = undefined(closes.len());
    if window == 0 || closes.len() <= window {
        return out;
    }

    let period = window as f64;
    let (mut avg_gain, mut avg_loss) = closes[..=window]
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gain, loss), change| {
            (gain + change.max(0.0), loss + (-change).max(0.0))
        });
    avg_gain /= period;
    avg_loss /= period;
    out[window] = strength_index(avg_gain, avg_loss);

    for idx in window + 1..closes.len() {
        let change = closes[idx] - closes[idx - 1];
        avg_gain = (avg_gain * (period - 1.0) + change.max(0.0)) / period;
        avg_loss = (avg_loss * (period - 1.0) + (-change).max(0.0)) / period;
        out[idx] = strength_index(avg_gain, avg_loss);
    }
    out
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// MACD line (fast EMA - slow EMA) and its signal EMA. The line is undefined
/// before `slow` bars exist, the signal before `slow + signal - 1`.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let Ok(mut indicator) = MovingAverageConvergenceDivergence::new(fast, slow, signal) else {
        return MacdSeries {
            macd: undefined(closes.len()),
            signal: undefined(closes.len()),
        };
    };

    let signal_warmup = slow + signal - 1;
    let mut series = MacdSeries {
        macd: Vec::with_capacity(closes.len()),
        signal: Vec::with_capacity(closes.len()),
    };
    for (idx, &close) in closes.iter().enumerate() {
        let out = indicator.next(close);
        let seen = idx + 1;
        series.macd.push(if seen < slow { f64::NAN } else { out.macd });
        series
            .signal
            .push(if seen < signal_warmup { f64::NAN } else { out.signal });
    }
    series
}

/// Strict upward crossing between the last two points: the earlier bar has
/// `line <= signal`, the latest has `line > signal`. Undefined values never cross.
pub fn golden_cross(line: &[f64], signal: &[f64]) -> bool {
    let n = line.len().min(signal.len());
    if n < 2 {
        return false;
    }
    let (prev_line, prev_signal) = (line[n - 2], signal[n - 2]);
    let (last_line, last_signal) = (line[n - 1], signal[n - 1]);
    prev_line <= prev_signal && last_line > last_signal
}

/// Named indicator a strategy can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    /// SMA of close.
    Ma(usize),
    /// SMA of volume.
    VolMa(usize),
    Rsi(usize),
    Macd { fast: usize, slow: usize, signal: usize },
    MacdSignal { fast: usize, slow: usize, signal: usize },
    /// Rolling max of high.
    High(usize),
}

impl IndicatorKind {
    pub const MACD_STANDARD: IndicatorKind = IndicatorKind::Macd {
        fast: 12,
        slow: 26,
        signal: 9,
    };
    pub const MACD_SIGNAL_STANDARD: IndicatorKind = IndicatorKind::MacdSignal {
        fast: 12,
        slow: 26,
        signal: 9,
    };
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Ma(w) => write!(f, "MA{w}"),
            IndicatorKind::VolMa(w) => write!(f, "VolMA{w}"),
            IndicatorKind::Rsi(w) => write!(f, "RSI{w}"),
            IndicatorKind::Macd { .. } => f.write_str("MACD"),
            IndicatorKind::MacdSignal { .. } => f.write_str("MACDsignal"),
            IndicatorKind::High(w) => write!(f, "High{w}"),
        }
    }
}

/// Indicators computed for one symbol and one strategy invocation.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: BTreeMap<IndicatorKind, Vec<f64>>,
}

impl IndicatorSet {
    pub fn compute(bars: &BarSeries, kinds: &[IndicatorKind]) -> Self {
        let closes = bars.closes();
        let mut series = BTreeMap::new();

        for &kind in kinds {
            if series.contains_key(&kind) {
                continue;
            }
            match kind {
                IndicatorKind::Ma(w) => {
                    series.insert(kind, sma(&closes, w));
                }
                IndicatorKind::VolMa(w) => {
                    series.insert(kind, sma(&bars.volumes(), w));
                }
                IndicatorKind::Rsi(w) => {
                    series.insert(kind, rsi(&closes, w));
                }
                IndicatorKind::High(w) => {
                    series.insert(kind, rolling_max(&bars.highs(), w));
                }
                IndicatorKind::Macd { fast, slow, signal }
                | IndicatorKind::MacdSignal { fast, slow, signal } => {
                    let out = macd(&closes, fast, slow, signal);
                    series.insert(IndicatorKind::Macd { fast, slow, signal }, out.macd);
                    series.insert(IndicatorKind::MacdSignal { fast, slow, signal }, out.signal);
                }
            }
        }

        Self { series }
    }

    pub fn series(&self, kind: IndicatorKind) -> Option<&[f64]> {
        self.series.get(&kind).map(Vec::as_slice)
    }

    /// Value at the latest bar, `None` when missing or undefined.
    pub fn latest(&self, kind: IndicatorKind) -> Option<f64> {
        self.series(kind)?.last().copied().filter(|v| v.is_finite())
    }

    /// Value at the bar before the latest.
    pub fn previous(&self, kind: IndicatorKind) -> Option<f64> {
        let values = self.series(kind)?;
        let idx = values.len().checked_sub(2)?;
        Some(values[idx]).filter(|v| v.is_finite())
    }

    pub fn names(&self) -> Vec<String> {
        self.series.keys().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, Symbol};
    use chrono::{Duration, NaiveDate};

    fn close_enough(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn series_from_closes(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 100.0 * (i + 1) as f64,
            })
            .collect();
        BarSeries::new(Symbol::from("TEST"), bars)
    }

    #[test]
    fn sma_masks_warmup() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert!(close_enough(out[2], 2.0));
        assert!(close_enough(out[4], 4.0));
    }

    #[test]
    fn sma_shorter_than_window_is_all_nan() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_max_degrades_to_available_history() {
        let out = rolling_max(&[3.0, 7.0, 5.0, 2.0, 1.0], YEAR_BARS);
        assert_eq!(out, vec![3.0, 7.0, 7.0, 7.0, 7.0]);

        let windowed = rolling_max(&[3.0, 7.0, 5.0, 2.0, 1.0], 2);
        assert_eq!(windowed[4], 2.0);
    }

    #[test]
    fn rsi_first_value_at_window() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert!(out[13].is_nan());
        assert!(close_enough(out[14], 100.0));
    }

    #[test]
    fn rsi_wilder_reference_values() {
        // Gains of 1 alternating with losses of 1 keep RSI at 50 after seeding.
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 10.0 } else { 11.0 })
            .collect();
        let out = rsi(&closes, 14);
        assert!(close_enough(out[14], 50.0));

        // Straight decline then one up day: avg_loss stays 1, avg_gain = 1/14.
        let mut falling: Vec<f64> = (0..15).map(|i| 50.0 - i as f64).collect();
        falling.push(37.0);
        let out = rsi(&falling, 14);
        let rs = (1.0 / 14.0) / (13.0 / 14.0);
        assert!(close_enough(out[15], 100.0 - 100.0 / (1.0 + rs)));
    }

    #[test]
    fn rsi_needs_more_than_window_bars() {
        assert!(rsi(&[1.0; 14], 14).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn macd_warmup_lengths() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin()).collect();
        let out = macd(&closes, 12, 26, 9);
        assert!(out.macd[24].is_nan());
        assert!(out.macd[25].is_finite());
        assert!(out.signal[32].is_nan());
        assert!(out.signal[33].is_finite());
    }

    #[test]
    fn golden_cross_requires_strict_crossing() {
        assert!(golden_cross(&[0.5, 1.5], &[1.0, 1.0]));
        assert!(golden_cross(&[1.0, 1.5], &[1.0, 1.0]));
        assert!(!golden_cross(&[1.5, 2.0], &[1.0, 1.0]));
        assert!(!golden_cross(&[0.5, 1.0], &[1.0, 1.0]));
        assert!(!golden_cross(&[f64::NAN, 1.5], &[1.0, 1.0]));
        assert!(!golden_cross(&[1.5], &[1.0]));
    }

    #[test]
    fn indicator_set_exposes_named_latest_values() {
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let bars = series_from_closes(&closes);
        let set = IndicatorSet::compute(
            &bars,
            &[
                IndicatorKind::Ma(5),
                IndicatorKind::VolMa(20),
                IndicatorKind::High(YEAR_BARS),
                IndicatorKind::Ma(200),
            ],
        );

        assert!(close_enough(set.latest(IndicatorKind::Ma(5)).unwrap(), 28.0));
        assert!(close_enough(set.previous(IndicatorKind::Ma(5)).unwrap(), 27.0));
        // volumes are 100..=3000, last 20 average (1100 + 3000) / 2
        assert!(close_enough(set.latest(IndicatorKind::VolMa(20)).unwrap(), 2050.0));
        assert!(close_enough(set.latest(IndicatorKind::High(YEAR_BARS)).unwrap(), 31.0));
        assert_eq!(set.latest(IndicatorKind::Ma(200)), None);
        assert_eq!(set.latest(IndicatorKind::Rsi(14)), None);
        assert_eq!(set.names(), vec!["MA5", "MA200", "VolMA20", "High250"]);
    }

    #[test]
    fn requesting_macd_computes_signal_too() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(
            &series_from_closes(&closes),
            &[IndicatorKind::MACD_STANDARD],
        );
        assert!(set.latest(IndicatorKind::MACD_STANDARD).is_some());
        assert!(set.latest(IndicatorKind::MACD_SIGNAL_STANDARD).is_some());
    }
}
