//! Concurrent fetch across configured providers, then reconciliation
//!
//! Providers without a key are skipped without a network call. Provider
//! failures are logged and treated as absence: they never fail a request.

use aqf_common::config::ProviderKeys;
use aqf_common::reconcile::{CombinedReading, ProviderPayloads, Reconciler, Source};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use super::airvisual::AirVisualClient;
use super::openweather::OpenWeatherClient;
use super::waqi::WaqiClient;
use super::{ProviderError, USER_AGENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    Active,
    Inactive,
    Error,
}

/// Probe result for one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub status: SourceState,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SourceStatus {
    fn from_result<T>(result: &Result<T, ProviderError>, timestamp: impl Fn(&T) -> Option<DateTime<Utc>>) -> Self {
        match result {
            Ok(reading) => Self {
                status: SourceState::Active,
                last_updated: timestamp(reading),
            },
            Err(ProviderError::MissingKey) => Self {
                status: SourceState::Inactive,
                last_updated: None,
            },
            Err(_) => Self {
                status: SourceState::Error,
                last_updated: None,
            },
        }
    }
}

pub struct ProviderFetcher {
    openweather: Option<OpenWeatherClient>,
    airvisual: Option<AirVisualClient>,
    waqi: Option<WaqiClient>,
    reconciler: Reconciler,
}

impl ProviderFetcher {
    /// Build clients for every configured key, sharing one HTTP client
    pub fn new(keys: &ProviderKeys, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let fetcher = Self {
            openweather: keys
                .openweather_api_key
                .clone()
                .map(|key| OpenWeatherClient::new(http.clone(), key)),
            airvisual: keys
                .airvisual_api_key
                .clone()
                .map(|key| AirVisualClient::new(http.clone(), key)),
            waqi: keys.waqi_token.clone().map(|token| WaqiClient::new(http, token)),
            reconciler: Reconciler::default(),
        };

        info!(sources = ?fetcher.configured_sources(), "Provider fetcher ready");
        Ok(fetcher)
    }

    /// Fetcher with no providers; every fetch yields nothing
    pub fn disabled() -> Self {
        Self {
            openweather: None,
            airvisual: None,
            waqi: None,
            reconciler: Reconciler::default(),
        }
    }

    pub fn configured_sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        if self.openweather.is_some() {
            sources.push(Source::OpenWeather);
        }
        if self.airvisual.is_some() {
            sources.push(Source::AirVisual);
        }
        if self.waqi.is_some() {
            sources.push(Source::Waqi);
        }
        sources
    }

    /// Query all providers concurrently; failures become `None`
    pub async fn fetch_all(&self, city: &str) -> ProviderPayloads {
        let (openweather, airvisual, waqi) = self.query_all(city).await;

        ProviderPayloads {
            openweather: absent_on_error(Source::OpenWeather, city, openweather),
            airvisual: absent_on_error(Source::AirVisual, city, airvisual),
            waqi: absent_on_error(Source::Waqi, city, waqi),
        }
    }

    /// Fetch and reconcile; `None` when no provider answered
    pub async fn fetch_combined(&self, city: &str) -> Option<CombinedReading> {
        let payloads = self.fetch_all(city).await;
        self.reconciler.reconcile(&payloads, Utc::now())
    }

    /// Probe every provider for `city`
    pub async fn source_status(&self, city: &str) -> BTreeMap<Source, SourceStatus> {
        let (openweather, airvisual, waqi) = self.query_all(city).await;

        BTreeMap::from([
            (Source::OpenWeather, SourceStatus::from_result(&openweather, |r| r.timestamp)),
            (Source::AirVisual, SourceStatus::from_result(&airvisual, |r| r.timestamp)),
            (Source::Waqi, SourceStatus::from_result(&waqi, |r| r.timestamp)),
        ])
    }

    async fn query_all(
        &self,
        city: &str,
    ) -> (
        Result<aqf_common::reconcile::OpenWeatherReading, ProviderError>,
        Result<aqf_common::reconcile::AirVisualReading, ProviderError>,
        Result<aqf_common::reconcile::WaqiReading, ProviderError>,
    ) {
        let openweather = async {
            match &self.openweather {
                Some(client) => client.fetch(city).await,
                None => Err(ProviderError::MissingKey),
            }
        };
        let airvisual = async {
            match &self.airvisual {
                Some(client) => client.fetch(city).await,
                None => Err(ProviderError::MissingKey),
            }
        };
        let waqi = async {
            match &self.waqi {
                Some(client) => client.fetch(city).await,
                None => Err(ProviderError::MissingKey),
            }
        };

        tokio::join!(openweather, airvisual, waqi)
    }
}

fn absent_on_error<T>(source: Source, city: &str, result: Result<T, ProviderError>) -> Option<T> {
    match result {
        Ok(reading) => Some(reading),
        Err(ProviderError::MissingKey) => None,
        Err(e) => {
            warn!(source = source.as_str(), city, error = %e, "Provider unavailable, treating as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyless_fetcher_yields_nothing() {
        let fetcher = ProviderFetcher::new(&ProviderKeys::default(), Duration::from_secs(1)).unwrap();
        assert!(fetcher.configured_sources().is_empty());
        assert!(fetcher.fetch_all("Mumbai").await.is_empty());
        assert!(fetcher.fetch_combined("Mumbai").await.is_none());
    }

    #[tokio::test]
    async fn test_keyless_status_is_inactive() {
        let status = ProviderFetcher::disabled().source_status("Mumbai").await;
        assert_eq!(status.len(), 3);
        assert!(status.values().all(|s| s.status == SourceState::Inactive));
        assert!(status.values().all(|s| s.last_updated.is_none()));
    }

    #[tokio::test]
    async fn test_unknown_city_is_absent_not_error() {
        let keys = ProviderKeys {
            openweather_api_key: Some("key".to_string()),
            airvisual_api_key: Some("key".to_string()),
            waqi_token: Some("token".to_string()),
        };
        let fetcher = ProviderFetcher::new(&keys, Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.configured_sources().len(), 3);

        // Unknown cities fail before any request is sent
        assert!(fetcher.fetch_combined("Atlantis").await.is_none());
        let status = fetcher.source_status("Atlantis").await;
        assert!(status.values().all(|s| s.status == SourceState::Error));
    }
}
