// src/strategies/scalper.rs
use crate::config::ScalpingConfig;
use crate::indicators::{IndicatorKind, IndicatorSet};
use crate::strategies::traits::{PriceLevels, Strategy};
use crate::types::{BarSeries, ScanMode, ScanParams, Signal};
use crate::utils::precision::Pricing;

/// Oversold rebound: RSI below the floor while the latest candle closes green.
pub struct ScalpingStrategy {
    config: ScalpingConfig,
    pricing: Pricing,
}

impl ScalpingStrategy {
    /// # Arguments
    /// * `config` - RSI window, oversold threshold, liquidity floor and exit multiples.
    /// * `pricing` - Tick grid the entry and exits are snapped to.
    pub fn new(config: ScalpingConfig, pricing: Pricing) -> Self {
        Self { config, pricing }
    }
}

impl Strategy for ScalpingStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::Scalping
    }

    fn min_bars(&self) -> usize {
        self.config.min_bars
    }

    fn lookback_days(&self) -> u32 {
        self.config.lookback_days
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![IndicatorKind::Rsi(self.config.rsi_window)]
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
        let rsi = indicators.latest(IndicatorKind::Rsi(self.config.rsi_window))?;

        let rebound = rsi < self.config.oversold
            && last.is_green()
            && last.traded_value() > self.config.min_traded_value;
        if !rebound {
            return None;
        }

        let levels = PriceLevels::from_close(
            last.close,
            self.config.take_profit,
            self.config.stop_loss,
            &self.pricing,
        )?;

        Some(
            levels
                .into_signal(series, ScanMode::Scalping, "SCALPING SNIPER")
                .note("✅ Rebound confirmed")
                .note(format!("RSI: {rsi:.1} (Oversold)"))
                .metric("rsi", rsi)
                .metric("traded_value", last.traded_value()),
        )
    }
}
