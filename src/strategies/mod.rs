// src/strategies/mod.rs
pub mod bsjp;
pub mod momentum;
pub mod scalper;
pub mod swing;
pub mod traits;

use crate::config::StrategyConfig;
use crate::types::ScanMode;
use crate::utils::precision::Pricing;

use self::bsjp::BsjpStrategy;
use self::momentum::MomentumStrategy;
use self::scalper::ScalpingStrategy;
use self::swing::SwingStrategy;
use self::traits::Strategy;

/// One configured strategy per scan mode.
pub struct StrategySet {
    bsjp: BsjpStrategy,
    swing: SwingStrategy,
    scalping: ScalpingStrategy,
    momentum: MomentumStrategy,
}

impl StrategySet {
    pub fn from_config(config: &StrategyConfig, pricing: Pricing) -> Self {
        Self {
            bsjp: BsjpStrategy::new(config.bsjp.clone(), pricing),
            swing: SwingStrategy::new(config.swing.clone(), pricing),
            scalping: ScalpingStrategy::new(config.scalping.clone(), pricing),
            momentum: MomentumStrategy::new(config.momentum.clone(), pricing),
        }
    }

    pub fn get(&self, mode: ScanMode) -> &dyn Strategy {
        match mode {
            ScanMode::Bsjp => &self.bsjp,
            ScanMode::Swing => &self.swing,
            ScanMode::Scalping => &self.scalping,
            ScanMode::Momentum => &self.momentum,
        }
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::from_config(&StrategyConfig::default(), Pricing::default())
    }
}
