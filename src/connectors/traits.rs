use crate::error::ProviderError;
use crate::types::{Bar, Symbol};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Historical daily bars provider.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Raw rows for `symbol` between `from` and `to` inclusive, in provider order.
    async fn daily_bars(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError>;
}

/// Index composition provider.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn index_constituents(&self, index_id: &str) -> Result<Vec<Symbol>, ProviderError>;
}

/// Outbound alert channel. Both operations take Markdown text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, message: &str) -> Result<()>;

    async fn send_image(&self, image: Vec<u8>, caption: &str) -> Result<()>;
}

/// Input for a signal chart: recent bars plus the three alert levels.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub title: String,
    pub bars: &'a [Bar],
    pub buy: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

pub trait ChartRenderer: Send + Sync {
    /// Encoded image bytes, or `None` when this renderer draws nothing.
    fn render(&self, request: &ChartRequest<'_>) -> Result<Option<Vec<u8>>>;
}

/// Renderer used when no chart backend is wired in; alerts go out as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChart;

impl ChartRenderer for NoChart {
    fn render(&self, _request: &ChartRequest<'_>) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
