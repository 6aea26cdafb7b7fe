// src/core/engine.rs
use crate::config::ScanConfig;
use crate::connectors::traits::{ChartRenderer, ChartRequest, Notifier};
use crate::indicators::IndicatorSet;
use crate::market::{BarRepository, UniverseResolver};
use crate::strategies::StrategySet;
use crate::types::{BarSeries, ScanMode, ScanParams, ScanRun, Signal, SymbolOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Courtesy pauses between provider and notifier calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub per_symbol: Duration,
    pub skipped: Duration,
    pub after_signal: Duration,
    pub chart_bars: usize,
}

impl ScanSettings {
    /// No pauses at all. Handy for tests and one-off manual scans.
    pub fn immediate(chart_bars: usize) -> Self {
        Self {
            per_symbol: Duration::ZERO,
            skipped: Duration::ZERO,
            after_signal: Duration::ZERO,
            chart_bars,
        }
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            per_symbol: Duration::from_millis(config.symbol_delay_ms),
            skipped: Duration::from_millis(config.skip_delay_ms),
            after_signal: Duration::from_millis(config.signal_delay_ms),
            chart_bars: config.chart_bars,
        }
    }
}

/// Runs one strategy over the resolved universe, strictly one symbol at a time.
pub struct ScanOrchestrator {
    universe: UniverseResolver,
    repository: BarRepository,
    strategies: StrategySet,
    notifier: Arc<dyn Notifier>,
    charts: Box<dyn ChartRenderer>,
    settings: ScanSettings,
}

impl ScanOrchestrator {
    pub fn new(
        universe: UniverseResolver,
        repository: BarRepository,
        strategies: StrategySet,
        notifier: Arc<dyn Notifier>,
        charts: Box<dyn ChartRenderer>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            universe,
            repository,
            strategies,
            notifier,
            charts,
            settings,
        }
    }

    /// A single pass. Per-symbol failures are recorded in the returned run and
    /// never abort the pass.
    pub async fn run(&self, mode: ScanMode, params: &ScanParams) -> ScanRun {
        let strategy = self.strategies.get(mode);
        let symbols = self.universe.resolve().await;
        let mut run = ScanRun::new(mode, params.clone(), symbols.clone());

        info!(
            run = %run.id,
            mode = %mode,
            session = ?params.session,
            symbols = symbols.len(),
            "Scan started"
        );

        for symbol in symbols {
            let Some(series) = self.repository.fetch(&symbol, strategy.lookback_days()).await else {
                debug!(symbol = %symbol, "Skipped: no history");
                run.record(symbol, SymbolOutcome::FetchFailed);
                pause(self.settings.skipped).await;
                continue;
            };

            if series.len() < strategy.min_bars() {
                debug!(
                    symbol = %symbol,
                    bars = series.len(),
                    required = strategy.min_bars(),
                    "Skipped: short history"
                );
                run.record(
                    symbol,
                    SymbolOutcome::InsufficientHistory {
                        bars: series.len(),
                        required: strategy.min_bars(),
                    },
                );
                pause(self.settings.skipped).await;
                continue;
            }

            let indicators = IndicatorSet::compute(&series, &strategy.indicators());
            debug!(symbol = %symbol, bars = series.len(), indicators = ?indicators.names(), "Evaluating");
            match strategy.evaluate(&series, &indicators, params) {
                Some(signal) => {
                    info!(
                        symbol = %symbol,
                        mode = %mode,
                        buy = %signal.buy,
                        take_profit = %signal.take_profit,
                        stop_loss = %signal.stop_loss,
                        metrics = ?signal.metrics,
                        "Signal found"
                    );
                    self.dispatch(&series, &signal).await;
                    run.record(symbol, SymbolOutcome::Signal(signal));
                    pause(self.settings.after_signal + self.settings.per_symbol).await;
                }
                None => {
                    run.record(symbol, SymbolOutcome::NoSignal);
                    pause(self.settings.per_symbol).await;
                }
            }
        }

        if strategy.reports_empty() && run.signal_count() == 0 {
            let notice = format!("😴 Mode {mode}: no signals (strict filter).");
            if let Err(e) = self.notifier.send_text(&notice).await {
                error!(mode = %mode, error = %e, "Failed to send empty-scan notice");
            }
        }

        run.finish();
        info!(
            run = %run.id,
            mode = %mode,
            signals = run.signal_count(),
            skipped = run.skipped_count(),
            elapsed_ms = run.elapsed().map_or(0, |d| d.num_milliseconds()),
            "Scan finished"
        );
        run
    }

    /// Chart first; without an image the alert still goes out as text.
    async fn dispatch(&self, series: &BarSeries, signal: &Signal) {
        let message = signal.to_markdown();
        let request = ChartRequest {
            title: format!("{} - {}", signal.symbol, signal.label),
            bars: series.tail(self.settings.chart_bars),
            buy: signal.buy,
            take_profit: signal.take_profit,
            stop_loss: signal.stop_loss,
        };

        let image = match self.charts.render(&request) {
            Ok(image) => image,
            Err(e) => {
                warn!(symbol = %signal.symbol, error = %e, "Chart rendering failed, sending text only");
                None
            }
        };

        let sent = match image {
            Some(bytes) => self.notifier.send_image(bytes, &message).await,
            None => self.notifier.send_text(&message).await,
        };
        if let Err(e) = sent {
            error!(symbol = %signal.symbol, error = %e, "Failed to dispatch signal");
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
