// src/strategies/traits.rs
use crate::indicators::{IndicatorKind, IndicatorSet};
use crate::types::{BarSeries, ScanMode, ScanParams, Signal};
use crate::utils::precision::Pricing;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Stateless rule evaluator for one scan mode.
pub trait Strategy: Send + Sync {
    fn mode(&self) -> ScanMode;

    /// Bars required before the rule may be evaluated.
    fn min_bars(&self) -> usize;

    /// Calendar days of history to request.
    fn lookback_days(&self) -> u32;

    fn indicators(&self) -> Vec<IndicatorKind>;

    /// Whether an empty pass is announced on the notification channel.
    fn reports_empty(&self) -> bool {
        false
    }

    /// Applies the entry rule to the latest bar. `None` is the normal
    /// non-match path, including undefined indicators.
    fn evaluate(
        &self,
        series: &BarSeries,
        indicators: &IndicatorSet,
        params: &ScanParams,
    ) -> Option<Signal>;

    /// Length check, indicator computation and evaluation in one call.
    fn scan(&self, series: &BarSeries, params: &ScanParams) -> Option<Signal> {
        if series.len() < self.min_bars() {
            return None;
        }
        let indicators = IndicatorSet::compute(series, &self.indicators());
        self.evaluate(series, &indicators, params)
    }
}

/// Entry, take-profit and stop-loss prices snapped to the tick grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevels {
    pub buy: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

impl PriceLevels {
    /// Buy at the snapped close; exits are multiples of the snapped buy.
    pub fn from_close(
        close: f64,
        take_profit: Decimal,
        stop_loss: Decimal,
        pricing: &Pricing,
    ) -> Option<Self> {
        let buy = pricing.apply(Decimal::from_f64(close)?);
        if buy <= Decimal::ZERO {
            return None;
        }
        Some(Self {
            buy,
            take_profit: pricing.apply(buy * take_profit),
            stop_loss: pricing.apply(buy * stop_loss),
        })
    }

    pub fn into_signal(self, series: &BarSeries, mode: ScanMode, label: impl Into<String>) -> Signal {
        Signal::new(
            series.symbol().clone(),
            mode,
            label,
            self.buy,
            self.take_profit,
            self.stop_loss,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision::PriceRounding;

    #[test]
    fn levels_truncate_from_truncated_buy() {
        let levels =
            PriceLevels::from_close(105.7, Decimal::new(103, 2), Decimal::new(98, 2), &Pricing::default())
                .unwrap();
        assert_eq!(levels.buy, Decimal::from(105));
        assert_eq!(levels.take_profit, Decimal::from(108));
        assert_eq!(levels.stop_loss, Decimal::from(102));
    }

    #[test]
    fn levels_round_to_nearest_when_configured() {
        let pricing = Pricing {
            rounding: PriceRounding::Nearest,
            tick_size: Decimal::ONE,
        };
        let levels =
            PriceLevels::from_close(52.0, Decimal::new(102, 2), Decimal::new(99, 2), &pricing).unwrap();
        assert_eq!(levels.take_profit, Decimal::from(53));
        assert_eq!(levels.stop_loss, Decimal::from(51));
    }

    #[test]
    fn non_finite_or_zero_close_has_no_levels() {
        let pricing = Pricing::default();
        assert!(PriceLevels::from_close(f64::NAN, Decimal::ONE, Decimal::ONE, &pricing).is_none());
        assert!(PriceLevels::from_close(0.4, Decimal::ONE, Decimal::ONE, &pricing).is_none());
    }
}
