// src/strategies/bsjp.rs
use crate::config::BsjpConfig;
use crate::indicators::{IndicatorKind, IndicatorSet};
use crate::strategies::traits::{PriceLevels, Strategy};
use crate::types::{BarSeries, ScanMode, ScanParams, Signal};
use crate::utils::precision::Pricing;

/// End-of-day momentum capture: a volume spike closing near its high, held
/// overnight.
pub struct BsjpStrategy {
    config: BsjpConfig,
    pricing: Pricing,
}

impl BsjpStrategy {
    pub fn new(config: BsjpConfig, pricing: Pricing) -> Self {
        Self { config, pricing }
    }
}

impl Strategy for BsjpStrategy {
    fn mode(&self) -> ScanMode {
        ScanMode::Bsjp
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
        _params: &ScanParams,
    ) -> Option<Signal> {
        let last = series.last()?;
        let ma = indicators.latest(IndicatorKind::Ma(self.config.ma_window))?;
        let volume_ma = indicators.latest(IndicatorKind::VolMa(self.config.volume_window))?;

        // Zero-range candle: wick ratio undefined.
        let range = last.range();
        if range <= 0.0 {
            return None;
        }
        let wick_ratio = (last.high - last.close) / range;

        let qualifies = last.volume > self.config.volume_multiple * volume_ma
            && last.close > ma
            && wick_ratio < self.config.max_wick_ratio
            && last.traded_value() > self.config.min_traded_value;
        if !qualifies {
            return None;
        }

        let spike = last.volume / volume_ma;
        let levels = PriceLevels::from_close(
            last.close,
            self.config.take_profit,
            self.config.stop_loss,
            &self.pricing,
        )?;

        Some(
            levels
                .into_signal(series, ScanMode::Bsjp, "BSJP PREMIUM")
                .note(format!("✅ Solid candle, upper wick {:.0}%", wick_ratio * 100.0))
                .note(format!("Vol Spike: {spike:.1}x 🚀"))
                .metric("volume_spike", spike)
                .metric("wick_ratio", wick_ratio)
                .metric("traded_value", last.traded_value()),
        )
    }
}
