// src/connectors/goapi.rs
use crate::config::ProviderConfig;
use crate::connectors::messages::{Constituent, Envelope, HistoricalRow, ResultList};
use crate::connectors::traits::{BarSource, UniverseSource};
use crate::error::ProviderError;
use crate::types::{Bar, Symbol};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// REST client for the market-data provider serving both daily history and
/// index composition.
pub struct GoApiClient {
    api_key: String,
    http_client: Client,
    base_url: Url,
}

impl GoApiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid provider base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Provider base URL cannot carry a path: {}", config.base_url);
        }

        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            api_key,
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<Envelope<T>, ProviderError> {
        debug!(url = %url, "Provider request");

        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BarSource for GoApiClient {
    async fn daily_bars(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        let url = self.endpoint(&["stock", "idx", symbol.as_str(), "historical"])?;
        let params = [
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
        ];

        let rows = self
            .get_json::<ResultList<HistoricalRow>>(url, &params)
            .await?
            .into_data()?
            .into_results()?;

        rows.iter().map(HistoricalRow::to_bar).collect()
    }
}

#[async_trait]
impl UniverseSource for GoApiClient {
    async fn index_constituents(&self, index_id: &str) -> Result<Vec<Symbol>, ProviderError> {
        let url = self.endpoint(&["stock", "idx", "index", index_id])?;

        let records = self
            .get_json::<ResultList<Constituent>>(url, &[])
            .await?
            .into_data()?
            .into_results()?;

        Ok(records
            .into_iter()
            .filter_map(Constituent::into_symbol)
            .collect())
    }
}
