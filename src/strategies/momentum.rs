// src/strategies/momentum.rs
use crate::config::MomentumConfig;
use crate::indicators::{IndicatorKind, IndicatorSet};
use crate::strategies::traits::{PriceLevels, Strategy};
use crate::types::{BarSeries, ScanMode, ScanParams, Signal};
use crate::utils::precision::Pricing;

/// Intraday continuation: a positive day-over-day move on rising volume above
/// the short average.
pub struct MomentumStrategy {
    config: MomentumConfig,
    pricing: Pricing,
}

impl MomentumStrategy {
    pub fn new(config: MomentumConfig, pricing: Pricing) -> Self {
        Self { config, pricing }
    }

    fn label(params: &ScanParams) -> String {
        match params.session {
            Some(session) => format!("MOMENTUM S{session}"),
            None => "MOMENTUM".to_string(),
        }
    }
}

impl Strategy for MomentumStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::Momentum
    }

    fn min_bars(&self) -> usize {
        self.config.min_bars
    }

    fn lookback_days(&self) -> u32 {
        self.config.lookback_days
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Ma(self.config.ma_window),
            IndicatorKind::VolMa(self.config.volume_window),
        ]
    }

    fn reports_empty(&self) -> bool {
        self.config.report_empty
    }

    fn evaluate(
        &self,
        series: &BarSeries,
        indicators: &IndicatorSet,
        params: &ScanParams,
    ) -> Option<Signal> {
        let last = series.last()?;
        let previous = series.previous()?;
        if previous.close <= 0.0 {
            return None;
        }
        let ma = indicators.latest(IndicatorKind::Ma(self.config.ma_window))?;
        let volume_ma = indicators.latest(IndicatorKind::VolMa(self.config.volume_window))?;

        let change_pct = (last.close - previous.close) / previous.close * 100.0;
        let continuing = change_pct > self.config.min_change_pct
            && last.volume > volume_ma
            && last.close > ma;
        if !continuing {
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
                .into_signal(series, ScanMode::Momentum, Self::label(params))
                .note(format!("✅ Up {change_pct:.1}% on the day"))
                .note(format!("Volume {:.1}x its {}-bar average", last.volume / volume_ma, self.config.volume_window))
                .metric("change_pct", change_pct)
                .metric("volume_ratio", last.volume / volume_ma),
        )
    }
}
