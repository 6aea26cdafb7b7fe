// src/strategies/swing.rs
use crate::config::SwingConfig;
use crate::indicators::{golden_cross, IndicatorKind, IndicatorSet, YEAR_BARS};
use crate::strategies::traits::{PriceLevels, Strategy};
use crate::types::{BarSeries, ScanMode, ScanParams, Signal};
use crate::utils::precision::Pricing;

/// Multi-day trend following: MACD golden cross above the long-term average.
pub struct SwingStrategy {
    config: SwingConfig,
    pricing: Pricing,
}

impl SwingStrategy {
    pub fn new(config: SwingConfig, pricing: Pricing) -> Self {
        Self { config, pricing }
    }

    fn macd_kinds(&self) -> (IndicatorKind, IndicatorKind) {
        let (fast, slow, signal) = (
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        );
        (
            IndicatorKind::Macd { fast, slow, signal },
            IndicatorKind::MacdSignal { fast, slow, signal },
        )
    }
}

impl Strategy for SwingStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::Swing
    }

    fn min_bars(&self) -> usize {
        self.config.min_bars
    }

    fn lookback_days(&self) -> u32 {
        self.config.lookback_days
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        let (line, signal) = self.macd_kinds();
        vec![
            line,
            signal,
            IndicatorKind::Ma(self.config.trend_window),
            IndicatorKind::High(YEAR_BARS),
        ]
    }

    fn reports_empty(&self) -> bool {
        self.config.report_empty
    }

    fn evaluate(
        &self,
        series: &BarSeries,
        indicators: &IndicatorSet,
        _params: &ScanParams,
    ) -> Option<Signal> {
        let last = series.last()?;
        let trend = indicators.latest(IndicatorKind::Ma(self.config.trend_window))?;

        let (line_kind, signal_kind) = self.macd_kinds();
        let crossed = golden_cross(
            indicators.series(line_kind)?,
            indicators.series(signal_kind)?,
        );
        if !crossed || last.close <= trend {
            return None;
        }

        let levels = PriceLevels::from_close(
            last.close,
            self.config.take_profit,
            self.config.stop_loss,
            &self.pricing,
        )?;

        let mut signal = levels
            .into_signal(series, ScanMode::Swing, "SWING PRO")
            .note(format!("✅ Trend: Bullish (> MA{})", self.config.trend_window))
            .note("Signal: MACD Golden Cross")
            .metric("trend_ma", trend);

        if let Some(year_high) = indicators.latest(IndicatorKind::High(YEAR_BARS)) {
            let below_high = (1.0 - last.close / year_high) * 100.0;
            signal = signal
                .note(format!("52w high: {year_high:.0} ({below_high:.1}% below)"))
                .metric("year_high", year_high);
        }
        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::macd;
    use crate::types::{Bar, Symbol};
    use chrono::{Duration, NaiveDate};

    /// Long steady rise, a sharp pullback, then a sharp recovery.
    fn trend_pullback_recovery() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..220).map(|i| 100.0 + i as f64).collect();
        let top = *closes.last().unwrap();
        closes.extend((1..=15).map(|i| top - 3.0 * i as f64));
        let bottom = *closes.last().unwrap();
        closes.extend((1..=25).map(|i| bottom + 4.0 * i as f64));
        closes
    }

    fn series(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000_000.0,
            })
            .collect();
        BarSeries::new(Symbol::from("BMRI"), bars)
    }

    fn strategy() -> SwingStrategy {
        SwingStrategy::new(SwingConfig::default(), Pricing::default())
    }

    #[test]
    fn fires_only_on_the_crossing_bar() {
        let closes = trend_pullback_recovery();
        let lines = macd(&closes, 12, 26, 9);
        let n = (221..closes.len())
            .find(|&i| lines.macd[i - 1] <= lines.signal[i - 1] && lines.macd[i] > lines.signal[i])
            .expect("recovery should produce a golden cross");

        let params = ScanParams::default();
        let at_cross = strategy().scan(&series(&closes[..=n]), &params);
        let before = strategy().scan(&series(&closes[..n]), &params);
        let after = strategy().scan(&series(&closes[..n + 2]), &params);

        let signal = at_cross.expect("swing should fire on the crossing bar");
        assert_eq!(signal.mode, ScanMode::Swing);
        assert!(before.is_none());
        assert!(after.is_none());
    }

    #[test]
    fn undefined_trend_average_is_no_signal() {
        let closes = trend_pullback_recovery();
        let short = series(&closes[..199]);
        let indicators = IndicatorSet::compute(&short, &strategy().indicators());
        assert!(strategy()
            .evaluate(&short, &indicators, &ScanParams::default())
            .is_none());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let closes = trend_pullback_recovery();
        let bars = series(&closes);
        let params = ScanParams::default();
        let results: Vec<_> = (0..3)
            .map(|_| {
                (0..closes.len())
                    .map(|end| strategy().scan(&series(&closes[..=end]), &params))
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
        assert_eq!(strategy().scan(&bars, &params), strategy().scan(&bars, &params));
    }
}
