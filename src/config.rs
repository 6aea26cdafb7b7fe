// src/config.rs

use crate::types::ScanMode;
use crate::utils::precision::{PriceRounding, Pricing};
use anyhow::{Context, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Index whose constituents form the scan universe.
    pub index_id: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.goapi.io".to_string(),
            index_id: "LQ45".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UniverseConfig {
    /// Used when the index provider fails.
    pub fallback: Vec<String>,
    /// Appended to every resolved universe.
    pub always_watch: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let list = |codes: &[&str]| -> Vec<String> { codes.iter().map(|c| c.to_string()).collect() };
        Self {
            fallback: list(&[
                "BBRI", "BBCA", "BMRI", "TLKM", "ASII", "ADRO", "UNTR", "GOTO", "EMTK",
            ]),
            always_watch: list(&[
                "BUMI", "DEWA", "ENRG", "BRMS", "GOTO", "ANTM", "DKFT", "PSAB", "ADRO", "PTBA",
            ]),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Pause after every evaluated symbol.
    pub symbol_delay_ms: u64,
    /// Pause after a symbol skipped for missing or short history.
    pub skip_delay_ms: u64,
    /// Extra pause after a signal is dispatched.
    pub signal_delay_ms: u64,
    pub rounding: PriceRounding,
    pub tick_size: Decimal,
    /// Trailing bars handed to the chart renderer.
    pub chart_bars: usize,
    /// Attach a candlestick chart to each alert; text-only when off.
    pub render_charts: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbol_delay_ms: 200,
            skip_delay_ms: 100,
            signal_delay_ms: 1_000,
            rounding: PriceRounding::Truncate,
            tick_size: Decimal::ONE,
            chart_bars: 60,
            render_charts: true,
        }
    }
}

impl ScanConfig {
    pub fn pricing(&self) -> Pricing {
        Pricing {
            rounding: self.rounding,
            tick_size: self.tick_size,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BsjpConfig {
    pub min_bars: usize,
    pub lookback_days: u32,
    pub ma_window: usize,
    pub volume_window: usize,
    pub volume_multiple: f64,
    pub max_wick_ratio: f64,
    pub min_traded_value: f64,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Send a "no signals" notice after an empty pass.
    pub report_empty: bool,
}

impl Default for BsjpConfig {
    fn default() -> Self {
        Self {
            min_bars: 60,
            lookback_days: 120,
            ma_window: 5,
            volume_window: 20,
            volume_multiple: 2.0,
            max_wick_ratio: 0.35,
            min_traded_value: 10_000_000_000.0,
            take_profit: Decimal::new(103, 2),
            stop_loss: Decimal::new(98, 2),
            report_empty: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SwingConfig {
    pub min_bars: usize,
    pub lookback_days: u32,
    pub trend_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub report_empty: bool,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            min_bars: 200,
            lookback_days: 420,
            trend_window: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            take_profit: Decimal::new(110, 2),
            stop_loss: Decimal::new(95, 2),
            report_empty: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScalpingConfig {
    pub min_bars: usize,
    pub lookback_days: u32,
    pub rsi_window: usize,
    pub oversold: f64,
    pub min_traded_value: f64,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub report_empty: bool,
}

impl Default for ScalpingConfig {
    fn default() -> Self {
        Self {
            min_bars: 20,
            lookback_days: 60,
            rsi_window: 14,
            oversold: 30.0,
            min_traded_value: 2_000_000_000.0,
            take_profit: Decimal::new(102, 2),
            stop_loss: Decimal::new(99, 2),
            report_empty: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MomentumConfig {
    pub min_bars: usize,
    pub lookback_days: u32,
    pub ma_window: usize,
    pub volume_window: usize,
    /// Minimum day-over-day close change, in percent.
    pub min_change_pct: f64,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub report_empty: bool,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            min_bars: 20,
            lookback_days: 60,
            ma_window: 5,
            volume_window: 5,
            min_change_pct: 1.0,
            take_profit: Decimal::new(103, 2),
            stop_loss: Decimal::new(98, 2),
            report_empty: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StrategyConfig {
    pub bsjp: BsjpConfig,
    pub swing: SwingConfig,
    pub scalping: ScalpingConfig,
    pub momentum: MomentumConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    /// IANA name of the exchange's time zone.
    pub timezone: String,
    pub poll_secs: u64,
    pub heartbeat_secs: u64,
    pub trading_days: Vec<Weekday>,
    /// Scan triggers in the exchange's local time.
    pub triggers: Vec<TriggerConfig>,
}

/// One scan trigger: a six-field cron expression (`sec min hour dom month dow`)
/// read in the exchange zone.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TriggerConfig {
    pub cron: String,
    pub mode: ScanMode,
    #[serde(default)]
    pub session: Option<u8>,
}

impl TriggerConfig {
    pub fn new(cron: &str, mode: ScanMode, session: Option<u8>) -> Self {
        Self {
            cron: cron.to_string(),
            mode,
            session,
        }
    }
}

/// IDX trading day: scalping every half hour, momentum twice per session,
/// BSJP before the closing auction and swing after the close.
fn default_triggers() -> Vec<TriggerConfig> {
    vec![
        TriggerConfig::new("0 0,30 9-11 * * *", ScanMode::Scalping, Some(1)),
        TriggerConfig::new("0 45 9 * * *", ScanMode::Momentum, Some(1)),
        TriggerConfig::new("0 15 11 * * *", ScanMode::Momentum, Some(1)),
        TriggerConfig::new("0 30 13 * * *", ScanMode::Scalping, Some(2)),
        TriggerConfig::new("0 0,30 14 * * *", ScanMode::Scalping, Some(2)),
        TriggerConfig::new("0 45 13 * * *", ScanMode::Momentum, Some(2)),
        TriggerConfig::new("0 15 14 * * *", ScanMode::Momentum, Some(2)),
        TriggerConfig::new("0 50 14 * * *", ScanMode::Bsjp, None),
        TriggerConfig::new("0 15 16 * * *", ScanMode::Swing, None),
    ]
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Jakarta".to_string(),
            poll_secs: 15,
            heartbeat_secs: 60,
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            triggers: default_triggers(),
        }
    }
}

impl ScheduleConfig {
    pub fn exchange_tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("bad exchange timezone: {}", self.timezone))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "idx_screener.log".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Secrets passed through from the process environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub telegram_token: String,
    pub chat_id: String,
    pub goapi_key: String,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            telegram_token: env::var("TELEGRAM_TOKEN").unwrap_or_default(),
            chat_id: env::var("CHAT_ID").unwrap_or_default(),
            goapi_key: env::var("GOAPI_KEY").unwrap_or_default(),
        }
    }

    /// Names of the variables that were not provided.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("TELEGRAM_TOKEN", &self.telegram_token),
            ("CHAT_ID", &self.chat_id),
            ("GOAPI_KEY", &self.goapi_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn warn_if_missing(&self) {
        let missing = self.missing();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                "Credentials not set; provider and notification calls will fail"
            );
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &str| if v.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("telegram_token", &mask(&self.telegram_token))
            .field("chat_id", &self.chat_id)
            .field("goapi_key", &mask(&self.goapi_key))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub universe: UniverseConfig,
    pub scan: ScanConfig,
    pub strategy: StrategyConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl AppConfig {
    /// Defaults, then an optional `Settings` file, then `APP__SECTION__KEY`
    /// environment overrides. Secrets come from their own variables.
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("Settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let mut app: AppConfig = config.try_deserialize()?;
        app.credentials = Credentials::from_env();
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_strategy_table() {
        let cfg = StrategyConfig::default();
        assert_eq!(cfg.bsjp.min_bars, 60);
        assert_eq!(cfg.swing.min_bars, 200);
        assert_eq!(cfg.scalping.min_bars, 20);
        assert_eq!(cfg.momentum.min_bars, 20);
        assert_eq!(cfg.bsjp.take_profit, Decimal::new(103, 2));
        assert_eq!(cfg.swing.stop_loss, Decimal::new(95, 2));
        assert!(cfg.bsjp.report_empty);
        assert!(!cfg.swing.report_empty);
    }

    #[test]
    fn defaults_survive_config_round_trip() {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.provider.index_id, "LQ45");
        assert_eq!(app.scan.tick_size, Decimal::ONE);
        assert_eq!(app.scan.rounding, PriceRounding::Truncate);
        assert_eq!(app.strategy.scalping.take_profit, Decimal::new(102, 2));
        assert_eq!(app.schedule.trading_days.len(), 5);
        assert_eq!(app.schedule.triggers, default_triggers());
    }

    #[test]
    fn exchange_timezone_parses() {
        let schedule = ScheduleConfig::default();
        assert_eq!(schedule.exchange_tz().unwrap(), chrono_tz::Asia::Jakarta);

        let bad = ScheduleConfig {
            timezone: "Mars/Olympus".to_string(),
            ..ScheduleConfig::default()
        };
        assert!(bad.exchange_tz().is_err());
    }

    #[test]
    fn missing_credentials_are_reported_not_fatal() {
        let creds = Credentials {
            telegram_token: String::new(),
            chat_id: "-100123".to_string(),
            goapi_key: " ".to_string(),
        };
        assert_eq!(creds.missing(), vec!["TELEGRAM_TOKEN", "GOAPI_KEY"]);
        assert!(format!("{creds:?}").contains("<unset>"));
    }
}
