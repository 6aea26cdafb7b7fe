// src/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Exchange ticker. Identity is exact, case-sensitive string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Symbol {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// One daily candle, dated in the exchange's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// `high >= max(open, close) >= min(open, close) >= low >= 0`, all finite.
    pub fn is_consistent(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return false;
        }
        self.high >= self.open.max(self.close) && self.open.min(self.close) >= self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Same-day traded value (`close * volume`).
    pub fn traded_value(&self) -> f64 {
        self.close * self.volume
    }

    pub fn is_green(&self) -> bool {
        self.close > self.open
    }
}

/// Daily bars for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: Symbol,
    bars: Vec<Bar>,
    discarded: usize,
}

impl BarSeries {
    /// Builds a series from raw provider rows: sorts ascending, keeps the last
    /// row for a duplicated date and drops rows violating the OHLC invariant.
    pub fn new(symbol: Symbol, mut rows: Vec<Bar>) -> Self {
        let total = rows.len();
        rows.sort_by_key(|bar| bar.date);

        let mut bars: Vec<Bar> = Vec::with_capacity(rows.len());
        for bar in rows.into_iter().filter(Bar::is_consistent) {
            match bars.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => bars.push(bar),
            }
        }

        let discarded = total - bars.len();
        Self {
            symbol,
            bars,
            discarded,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Number of provider rows dropped as duplicates or inconsistent candles.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The bar before the latest one.
    pub fn previous(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|idx| &self.bars[idx])
    }

    /// The trailing `n` bars (or all of them when shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// Strategy mode a scan runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanMode {
    Bsjp,
    Swing,
    Scalping,
    Momentum,
}

impl ScanMode {
    pub const ALL: [ScanMode; 4] = [
        ScanMode::Bsjp,
        ScanMode::Swing,
        ScanMode::Scalping,
        ScanMode::Momentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Bsjp => "BSJP",
            ScanMode::Swing => "SWING",
            ScanMode::Scalping => "SCALPING",
            ScanMode::Momentum => "MOMENTUM",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scan mode: {s}"))
    }
}

/// Mode-specific parameters carried by a schedule entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParams {
    /// Trading session number (1 or 2) for intraday modes.
    pub session: Option<u8>,
}

impl ScanParams {
    pub fn session(session: u8) -> Self {
        Self {
            session: Some(session),
        }
    }
}

/// An actionable alert produced by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: Symbol,
    pub mode: ScanMode,
    pub label: String,
    pub buy: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Human-readable rationale lines, in display order.
    pub notes: Vec<String>,
    pub metrics: BTreeMap<&'static str, f64>,
}

impl Signal {
    pub fn new(
        symbol: Symbol,
        mode: ScanMode,
        label: impl Into<String>,
        buy: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
    ) -> Self {
        Self {
            symbol,
            mode,
            label: label.into(),
            buy,
            take_profit,
            stop_loss,
            notes: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn note(mut self, line: impl Into<String>) -> Self {
        self.notes.push(line.into());
        self
    }

    pub fn metric(mut self, name: &'static str, value: f64) -> Self {
        self.metrics.insert(name, value);
        self
    }

    fn icon(&self) -> &'static str {
        match self.mode {
            ScanMode::Bsjp => "💎",
            ScanMode::Swing => "🌊",
            ScanMode::Scalping => "⚡",
            ScanMode::Momentum => "🚀",
        }
    }

    /// Telegram Markdown message body.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![format!("{} *{}* ({})", self.icon(), self.symbol, self.label)];
        lines.push(format!(
            "📈 Buy: {} | 🎯 TP: {} | 🛑 SL: {}",
            self.buy, self.take_profit, self.stop_loss
        ));
        lines.extend(self.notes.iter().cloned());
        lines.join("\n")
    }
}

/// What happened to one symbol during a scan pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Signal(Signal),
    NoSignal,
    InsufficientHistory { bars: usize, required: usize },
    FetchFailed,
}

impl SymbolOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            SymbolOutcome::InsufficientHistory { .. } | SymbolOutcome::FetchFailed
        )
    }
}

/// Ephemeral record of one orchestration pass.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub id: Uuid,
    pub mode: ScanMode,
    pub params: ScanParams,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub universe: Vec<Symbol>,
    pub outcomes: Vec<(Symbol, SymbolOutcome)>,
}

impl ScanRun {
    pub fn new(mode: ScanMode, params: ScanParams, universe: Vec<Symbol>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            params,
            started_at: Utc::now(),
            finished_at: None,
            universe,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, symbol: Symbol, outcome: SymbolOutcome) {
        self.outcomes.push((symbol, outcome));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall time of a finished run.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            SymbolOutcome::Signal(signal) => Some(signal),
            _ => None,
        })
    }

    pub fn signal_count(&self) -> usize {
        self.signals().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_skipped()).count()
    }

    pub fn outcome(&self, symbol: &Symbol) -> Option<&SymbolOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, outcome)| outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn series_sorts_and_keeps_last_duplicate() {
        let rows = vec![
            bar(4, 10.0, 11.0, 9.0, 10.5),
            bar(1, 10.0, 11.0, 9.0, 10.0),
            bar(4, 10.0, 12.0, 9.0, 11.5),
        ];
        let series = BarSeries::new(Symbol::from("BBRI"), rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date.day0(), 0);
        assert_eq!(series.last().unwrap().close, 11.5);
        assert_eq!(series.discarded(), 1);
    }

    #[test]
    fn series_drops_inconsistent_candles() {
        let rows = vec![
            bar(1, 10.0, 11.0, 9.0, 10.0),
            // high below close
            bar(2, 10.0, 10.0, 9.0, 10.5),
            bar(3, 10.0, 11.0, 9.0, f64::NAN),
        ];
        let series = BarSeries::new(Symbol::from("TLKM"), rows);

        assert_eq!(series.len(), 1);
        assert_eq!(series.discarded(), 2);
    }

    #[test]
    fn previous_and_tail() {
        let rows = (1..=5).map(|d| bar(d, 1.0, 2.0, 0.5, 1.5)).collect();
        let series = BarSeries::new(Symbol::from("ASII"), rows);

        assert_eq!(series.previous().unwrap().date.day(), 4);
        assert_eq!(series.tail(3).len(), 3);
        assert_eq!(series.tail(60).len(), 5);
    }

    #[test]
    fn scan_mode_parses_case_insensitively() {
        assert_eq!("swing".parse::<ScanMode>().unwrap(), ScanMode::Swing);
        assert_eq!("BSJP".parse::<ScanMode>().unwrap(), ScanMode::Bsjp);
        assert!("daytrade".parse::<ScanMode>().is_err());
    }

    #[test]
    fn signal_markdown_lists_levels_and_notes() {
        let signal = Signal::new(
            Symbol::from("ADRO"),
            ScanMode::Bsjp,
            "BSJP PREMIUM",
            Decimal::from(105),
            Decimal::from(108),
            Decimal::from(102),
        )
        .note("Vol Spike: 3.0x");

        let text = signal.to_markdown();
        assert!(text.starts_with("💎 *ADRO* (BSJP PREMIUM)"));
        assert!(text.contains("Buy: 105 | 🎯 TP: 108 | 🛑 SL: 102"));
        assert!(text.ends_with("Vol Spike: 3.0x"));
    }
}
