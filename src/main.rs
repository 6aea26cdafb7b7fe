// src/main.rs
use anyhow::Context;
use dotenvy::dotenv;
use idx_screener::config::AppConfig;
use idx_screener::connectors::chart::CandleChart;
use idx_screener::connectors::goapi::GoApiClient;
use idx_screener::connectors::telegram::TelegramNotifier;
use idx_screener::connectors::traits::{ChartRenderer, NoChart, Notifier};
use idx_screener::core::engine::{ScanOrchestrator, ScanSettings};
use idx_screener::core::scheduler::{startup_notice, Schedule, SessionScheduler};
use idx_screener::logging::init_logging;
use idx_screener::market::{BarRepository, UniverseResolver};
use idx_screener::strategies::StrategySet;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Configuration and logging
    let config = AppConfig::new().context("failed to load configuration")?;
    let _guards = init_logging(&config.logging);
    config.credentials.warn_if_missing();
    let exchange_tz = config.schedule.exchange_tz()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        index = %config.provider.index_id,
        timezone = %exchange_tz,
        host_time = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z"),
        "IDX screener starting"
    );

    // 2. Adapters
    let provider = Arc::new(GoApiClient::new(
        &config.provider,
        config.credentials.goapi_key.clone(),
    )?);
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        config.credentials.telegram_token.clone(),
        config.credentials.chat_id.clone(),
        config.provider.timeout(),
    ));

    // 3. Scan pipeline
    let universe = UniverseResolver::new(provider.clone(), &config.provider.index_id, &config.universe);
    let repository = BarRepository::new(provider, exchange_tz);
    let strategies = StrategySet::from_config(&config.strategy, config.scan.pricing());
    let charts: Box<dyn ChartRenderer> = if config.scan.render_charts {
        Box::new(CandleChart::default())
    } else {
        Box::new(NoChart)
    };
    let orchestrator = ScanOrchestrator::new(
        universe,
        repository,
        strategies,
        notifier.clone(),
        charts,
        ScanSettings::from(&config.scan),
    );

    // 4. Schedule
    let schedule = Schedule::from_config(&config.schedule)?;
    if let Err(e) = notifier.send_text(&startup_notice(&schedule)).await {
        error!(error = %e, "Failed to send startup notice");
    }

    SessionScheduler::new(
        schedule,
        orchestrator,
        config.schedule.poll_interval(),
        config.schedule.heartbeat_interval(),
    )
    .run()
    .await;

    Ok(())
}
