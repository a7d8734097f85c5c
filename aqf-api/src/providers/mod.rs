//! Upstream air-quality providers
//!
//! Each client turns its provider's JSON into the normalized reading types of
//! `aqf_common::reconcile`. Parsing is split from the HTTP call so it can be
//! tested against fixture payloads.

pub mod airvisual;
pub mod fetcher;
pub mod openweather;
pub mod waqi;

pub use fetcher::{ProviderFetcher, SourceState, SourceStatus};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const USER_AGENT: &str = concat!("aqf-api/", env!("CARGO_PKG_VERSION"));

/// Provider client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("API key not configured")]
    MissingKey,

    #[error("Unsupported city: {0}")]
    UnknownCity(String),

    /// Provider answered but reported a failure status
    #[error("Provider status: {0}")]
    Status(String),
}

/// GET `url` with `query` and decode the JSON body
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, ProviderError> {
    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError(status.as_u16(), body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

/// Parse an RFC 3339 / ISO 8601 timestamp with offset
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-01-15T10:00:00+05:30").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T04:30:00+00:00");
        assert!(parse_timestamp("2024-01-15T10:00:00.000Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
