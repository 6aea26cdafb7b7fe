// src/market/repository.rs
use crate::connectors::traits::BarSource;
use crate::types::{BarSeries, Symbol};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validated daily history per symbol. Every failure collapses to `None`.
pub struct BarRepository {
    source: Arc<dyn BarSource>,
    exchange_tz: Tz,
}

impl BarRepository {
    pub fn new(source: Arc<dyn BarSource>, exchange_tz: Tz) -> Self {
        Self {
            source,
            exchange_tz,
        }
    }

    /// History ending today in the exchange's calendar.
    pub async fn fetch(&self, symbol: &Symbol, lookback_days: u32) -> Option<BarSeries> {
        let today = Utc::now().with_timezone(&self.exchange_tz).date_naive();
        self.fetch_until(symbol, today, lookback_days).await
    }

    pub async fn fetch_until(
        &self,
        symbol: &Symbol,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Option<BarSeries> {
        let (from, to) = date_range(today, lookback_days);

        let rows = match self.source.daily_bars(symbol, from, to).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Bar fetch failed");
                return None;
            }
        };

        let series = BarSeries::new(symbol.clone(), rows);
        if series.discarded() > 0 {
            debug!(
                symbol = %symbol,
                discarded = series.discarded(),
                "Dropped duplicate or inconsistent rows"
            );
        }
        if series.is_empty() {
            debug!(symbol = %symbol, "No usable bars");
            return None;
        }
        Some(series)
    }
}

/// Inclusive calendar range of `lookback_days` ending at `today`.
pub fn date_range(today: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    let from = today
        .checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .unwrap_or(NaiveDate::MIN);
    (from, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::connectors::traits::BarSource;
    use crate::types::Bar;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubSource {
        rows: Result<Vec<Bar>, ()>,
        requested: Mutex<Option<(NaiveDate, NaiveDate)>>,
    }

    #[async_trait]
    impl BarSource for StubSource {
        async fn daily_bars(
            &self,
            _symbol: &Symbol,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<Bar>, ProviderError> {
            *self.requested.lock().unwrap() = Some((from, to));
            self.rows
                .clone()
                .map_err(|_| ProviderError::Rejected("stub".to_string()))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> Bar {
        Bar {
            date: day(d),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    fn stub_repo(rows: Result<Vec<Bar>, ()>) -> (BarRepository, Arc<StubSource>) {
        let source = Arc::new(StubSource {
            rows,
            requested: Mutex::new(None),
        });
        (
            BarRepository::new(source.clone(), chrono_tz::Asia::Jakarta),
            source,
        )
    }

    #[test]
    fn range_spans_lookback() {
        assert_eq!(date_range(day(31), 30), (day(1), day(31)));
    }

    #[tokio::test]
    async fn rows_are_sorted_into_series() {
        let (repo, source) = stub_repo(Ok(vec![bar(3, 12.0), bar(1, 10.0), bar(2, 11.0)]));
        let series = repo.fetch_until(&Symbol::from("BBCA"), day(10), 9).await.unwrap();

        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(*source.requested.lock().unwrap(), Some((day(1), day(10))));
    }

    #[tokio::test]
    async fn provider_error_is_absent() {
        let (repo, _) = stub_repo(Err(()));
        assert!(repo.fetch_until(&Symbol::from("BBCA"), day(10), 9).await.is_none());
    }

    #[tokio::test]
    async fn empty_history_is_absent() {
        let (repo, _) = stub_repo(Ok(vec![]));
        assert!(repo.fetch_until(&Symbol::from("BBCA"), day(10), 9).await.is_none());
    }
}
