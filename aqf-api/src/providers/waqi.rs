//! World Air Quality Index feed client

use aqf_common::cities;
use aqf_common::reconcile::WaqiReading;
use aqf_common::{Pollutant, PollutantReading};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::{get_json, parse_timestamp, ProviderError};

pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// Envelope: `data` is the feed on "ok" and an error string otherwise
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    pub status: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct FeedData {
    /// Number, or "-" when the station has no current value
    #[serde(default)]
    pub aqi: serde_json::Value,
    #[serde(default)]
    pub iaqi: BTreeMap<String, IaqiValue>,
    pub dominentpol: Option<String>,
    pub city: Option<FeedCity>,
    pub time: Option<FeedTime>,
}

#[derive(Debug, Deserialize)]
pub struct IaqiValue {
    pub v: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedCity {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedTime {
    pub iso: Option<String>,
}

/// Keys of `iaqi` that map to tracked pollutants; weather keys (t, h, p, w) are skipped
const IAQI_KEYS: [(&str, Pollutant); 6] = [
    ("pm25", Pollutant::Pm25),
    ("pm10", Pollutant::Pm10),
    ("no2", Pollutant::No2),
    ("so2", Pollutant::So2),
    ("co", Pollutant::Co),
    ("o3", Pollutant::O3),
];

pub fn parse_response(body: FeedResponse) -> Result<WaqiReading, ProviderError> {
    if body.status != "ok" {
        let message = body.data.as_str().unwrap_or("Unknown error");
        return Err(ProviderError::Status(message.to_string()));
    }

    let data: FeedData =
        serde_json::from_value(body.data).map_err(|e| ProviderError::ParseError(e.to_string()))?;

    let pollutants: PollutantReading = IAQI_KEYS
        .iter()
        .filter_map(|(key, pollutant)| data.iaqi.get(*key).and_then(|v| v.v).map(|v| (*pollutant, v)))
        .collect();

    Ok(WaqiReading {
        timestamp: data
            .time
            .as_ref()
            .and_then(|t| t.iso.as_deref())
            .and_then(parse_timestamp),
        aqi: data.aqi.as_f64(),
        pollutants,
        dominant_pollutant: data.dominentpol.as_deref().and_then(|p| p.parse().ok()),
        station_name: data.city.and_then(|c| c.name),
    })
}

#[derive(Debug, Clone)]
pub struct WaqiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl WaqiClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self {
            http,
            base_url: WAQI_BASE_URL.to_string(),
            token,
        }
    }

    pub async fn fetch(&self, city: &str) -> Result<WaqiReading, ProviderError> {
        // Only catalog names reach the URL path
        let info = cities::find(city).ok_or_else(|| ProviderError::UnknownCity(city.to_string()))?;
        let url = format!("{}/feed/{}/", self.base_url, info.name);

        debug!(city, "Querying WAQI");
        let body: FeedResponse = get_json(&self.http, &url, &[("token", self.token.as_str())]).await?;

        parse_response(body)
    }
}
