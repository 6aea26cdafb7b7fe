// src/utils/precision.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How output prices snap to the instrument's tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceRounding {
    /// Round down to the tick below (display convention of the alerts).
    #[default]
    Truncate,
    /// Round to the nearest tick.
    Nearest,
}

/// Rounds a price DOWN to a multiple of `tick_size`.
/// Example: price=108.15, tick=1 -> 108
pub fn truncate_to_tick(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size <= Decimal::ZERO {
        return price;
    }
    (price / tick_size).floor() * tick_size
}

/// Rounds a price to the NEAREST multiple of `tick_size`.
/// Example: price=100.16, tick=0.1 -> 100.2
pub fn round_to_tick(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size <= Decimal::ZERO {
        return price;
    }
    (price / tick_size).round() * tick_size
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub rounding: PriceRounding,
    pub tick_size: Decimal,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            rounding: PriceRounding::Truncate,
            tick_size: Decimal::ONE,
        }
    }
}

impl Pricing {
    pub fn apply(&self, price: Decimal) -> Decimal {
        match self.rounding {
            PriceRounding::Truncate => truncate_to_tick(price, self.tick_size),
            PriceRounding::Nearest => round_to_tick(price, self.tick_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn truncates_to_integer_ticks() {
        assert_eq!(truncate_to_tick(dec("53.04"), Decimal::ONE), dec("53"));
        assert_eq!(truncate_to_tick(dec("51.48"), Decimal::ONE), dec("51"));
        assert_eq!(truncate_to_tick(dec("102.9"), Decimal::ONE), dec("102"));
    }

    #[test]
    fn nearest_rounds_half_ticks() {
        assert_eq!(round_to_tick(dec("100.16"), dec("0.1")), dec("100.2"));
        assert_eq!(round_to_tick(dec("51.48"), Decimal::ONE), dec("51"));
        assert_eq!(round_to_tick(dec("53.6"), dec("5")), dec("55"));
    }

    #[test]
    fn zero_tick_is_passthrough() {
        assert_eq!(truncate_to_tick(dec("7.77"), Decimal::ZERO), dec("7.77"));
        assert_eq!(round_to_tick(dec("7.77"), Decimal::ZERO), dec("7.77"));
    }

    #[test]
    fn pricing_dispatches_on_policy() {
        let nearest = Pricing {
            rounding: PriceRounding::Nearest,
            tick_size: Decimal::ONE,
        };
        assert_eq!(Pricing::default().apply(dec("110.9")), dec("110"));
        assert_eq!(nearest.apply(dec("110.9")), dec("111"));
    }
}
