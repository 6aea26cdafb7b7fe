// src/connectors/messages.rs
use crate::error::ProviderError;
use crate::types::{Bar, Symbol};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// Envelope shared by every provider endpoint:
/// `{"status": "success", "message": ..., "data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps `data` from a successful envelope.
    pub fn into_data(self) -> Result<T, ProviderError> {
        if !self.status.eq_ignore_ascii_case("success") {
            let reason = self.message.unwrap_or(self.status);
            return Err(ProviderError::Rejected(reason));
        }
        self.data
            .ok_or_else(|| ProviderError::Malformed("missing `data`".to_string()))
    }
}

/// `data` payload holding a list of records.
#[derive(Debug, Deserialize)]
pub struct ResultList<T> {
    pub results: Option<Vec<T>>,
}

impl<T> ResultList<T> {
    pub fn into_results(self) -> Result<Vec<T>, ProviderError> {
        self.results
            .ok_or_else(|| ProviderError::Malformed("missing `results`".to_string()))
    }
}

/// One historical row. Numeric columns arrive either as JSON numbers or as
/// numeric strings depending on the endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoricalRow {
    pub date: String,
    pub open: Value,
    pub high: Value,
    pub low: Value,
    pub close: Value,
    pub volume: Value,
}

impl HistoricalRow {
    pub fn to_bar(&self) -> Result<Bar, ProviderError> {
        Ok(Bar {
            date: parse_date(&self.date)?,
            open: coerce_number("open", &self.open)?,
            high: coerce_number("high", &self.high)?,
            low: coerce_number("low", &self.low)?,
            close: coerce_number("close", &self.close)?,
            volume: coerce_number("volume", &self.volume)?,
        })
    }
}

/// Index constituent record; only the ticker matters here.
#[derive(Debug, Deserialize)]
pub struct Constituent {
    pub symbol: String,
}

impl Constituent {
    pub fn into_symbol(self) -> Option<Symbol> {
        let code = self.symbol.trim();
        (!code.is_empty()).then(|| Symbol::new(code))
    }
}

pub fn coerce_number(field: &str, value: &Value) -> Result<f64, ProviderError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProviderError::Malformed(format!("`{field}` is not numeric: {value}")))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ProviderError> {
    raw.trim()
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| ProviderError::Malformed(format!("bad date: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_coerce() {
        assert_eq!(coerce_number("close", &json!(105)).unwrap(), 105.0);
        assert_eq!(coerce_number("close", &json!("4520.5")).unwrap(), 4520.5);
        assert!(coerce_number("close", &json!("n/a")).is_err());
        assert!(coerce_number("close", &json!(null)).is_err());
    }

    #[test]
    fn dates_accept_timestamp_suffix() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(parse_date("2024-05-17").unwrap(), day);
        assert_eq!(parse_date("2024-05-17T00:00:00+07:00").unwrap(), day);
        assert!(parse_date("17/05/2024").is_err());
        assert!(parse_date("2024").is_err());
    }

    #[test]
    fn failed_envelope_is_rejected() {
        let env: Envelope<ResultList<Constituent>> =
            serde_json::from_value(json!({"status": "error", "message": "Invalid API key"}))
                .unwrap();
        match env.into_data() {
            Err(ProviderError::Rejected(msg)) => assert_eq!(msg, "Invalid API key"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn missing_results_is_malformed() {
        let env: Envelope<ResultList<HistoricalRow>> =
            serde_json::from_value(json!({"status": "success", "data": {}})).unwrap();
        let data = env.into_data().unwrap();
        assert!(matches!(
            data.into_results(),
            Err(ProviderError::Malformed(_))
        ));
    }
}
