//! OpenWeatherMap air pollution client

use aqf_common::cities;
use aqf_common::reconcile::OpenWeatherReading;
use aqf_common::{Pollutant, PollutantReading};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{get_json, ProviderError};

pub const OPENWEATHER_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/air_pollution";

#[derive(Debug, Deserialize)]
pub struct AirPollutionResponse {
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionEntry {
    pub dt: Option<i64>,
    pub main: Option<AirPollutionIndex>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionIndex {
    pub aqi: Option<u8>,
}

/// Concentrations in µg/m³
#[derive(Debug, Default, Deserialize)]
pub struct Components {
    pub co: Option<f64>,
    pub no: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub nh3: Option<f64>,
}

/// Normalize the first entry of an air pollution response
///
/// NO and NH3 are reported but not tracked.
pub fn parse_response(body: AirPollutionResponse) -> Result<OpenWeatherReading, ProviderError> {
    let entry = body
        .list
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ParseError("empty list".to_string()))?;

    let c = &entry.components;
    let pollutants: PollutantReading = [
        (Pollutant::Pm25, c.pm2_5),
        (Pollutant::Pm10, c.pm10),
        (Pollutant::No2, c.no2),
        (Pollutant::So2, c.so2),
        (Pollutant::Co, c.co),
        (Pollutant::O3, c.o3),
    ]
    .into_iter()
    .filter_map(|(p, v)| v.map(|v| (p, v)))
    .collect();

    Ok(OpenWeatherReading {
        timestamp: entry.dt.and_then(|dt| Utc.timestamp_opt(dt, 0).single()),
        index: entry.main.and_then(|m| m.aqi),
        pollutants,
    })
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Current pollution at the city's coordinates
    pub async fn fetch(&self, city: &str) -> Result<OpenWeatherReading, ProviderError> {
        let info = cities::find(city).ok_or_else(|| ProviderError::UnknownCity(city.to_string()))?;
        let lat = info.latitude.to_string();
        let lon = info.longitude.to_string();

        debug!(city, "Querying OpenWeatherMap");
        let body: AirPollutionResponse = get_json(
            &self.http,
            &self.base_url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
            ],
        )
        .await?;

        parse_response(body)
    }
}
