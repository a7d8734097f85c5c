//! AirVisual (IQAir) city client

use aqf_common::cities::{self, COUNTRY};
use aqf_common::reconcile::AirVisualReading;
use serde::Deserialize;
use tracing::debug;

use super::{get_json, parse_timestamp, ProviderError};

pub const AIRVISUAL_BASE_URL: &str = "http://api.airvisual.com/v2/city";

/// Envelope: `data` is the reading on success and `{message}` otherwise
#[derive(Debug, Deserialize)]
pub struct CityResponse {
    pub status: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CityData {
    pub current: Current,
}

#[derive(Debug, Deserialize)]
pub struct Current {
    pub pollution: Pollution,
    pub weather: Option<WeatherBlock>,
}

#[derive(Debug, Deserialize)]
pub struct Pollution {
    pub ts: Option<String>,
    pub aqius: Option<f64>,
    pub aqicn: Option<f64>,
    pub mainus: Option<String>,
    pub maincn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherBlock {
    /// Temperature, °C
    pub tp: Option<f64>,
    /// Humidity, %
    pub hu: Option<f64>,
    /// Pressure, hPa
    pub pr: Option<f64>,
    /// Wind speed, m/s
    pub ws: Option<f64>,
}

pub fn parse_response(body: CityResponse) -> Result<AirVisualReading, ProviderError> {
    if body.status != "success" {
        let message = body
            .data
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(ProviderError::Status(message.to_string()));
    }

    let data: CityData =
        serde_json::from_value(body.data).map_err(|e| ProviderError::ParseError(e.to_string()))?;
    let pollution = data.current.pollution;
    let weather = data.current.weather;

    Ok(AirVisualReading {
        timestamp: pollution.ts.as_deref().and_then(parse_timestamp),
        aqi_us: pollution.aqius,
        aqi_cn: pollution.aqicn,
        main_pollutant_us: pollution.mainus.as_deref().and_then(|m| m.parse().ok()),
        temperature: weather.as_ref().and_then(|w| w.tp),
        humidity: weather.as_ref().and_then(|w| w.hu),
        pressure: weather.as_ref().and_then(|w| w.pr),
        wind_speed: weather.as_ref().and_then(|w| w.ws),
    })
}

#[derive(Debug, Clone)]
pub struct AirVisualClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AirVisualClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            base_url: AIRVISUAL_BASE_URL.to_string(),
            api_key,
        }
    }

    pub async fn fetch(&self, city: &str) -> Result<AirVisualReading, ProviderError> {
        let info = cities::find(city).ok_or_else(|| ProviderError::UnknownCity(city.to_string()))?;

        debug!(city, state = info.state, "Querying AirVisual");
        let body: CityResponse = get_json(
            &self.http,
            &self.base_url,
            &[
                ("city", info.name),
                ("state", info.state),
                ("country", COUNTRY),
                ("key", self.api_key.as_str()),
            ],
        )
        .await?;

        parse_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqf_common::Pollutant;

    const FIXTURE: &str = r#"{
        "status": "success",
        "data": {
            "city": "Delhi", "state": "Delhi", "country": "India",
            "current": {
                "pollution": {
                    "ts": "2024-01-15T10:00:00.000Z",
                    "aqius": 187, "mainus": "p2",
                    "aqicn": 136, "maincn": "p2"
                },
                "weather": {
                    "ts": "2024-01-15T10:00:00.000Z",
                    "tp": 18, "pr": 1016, "hu": 72, "ws": 2.57, "wd": 290, "ic": "50d"
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_fixture() {
        let body: CityResponse = serde_json::from_str(FIXTURE).unwrap();
        let reading = parse_response(body).unwrap();

        assert_eq!(reading.aqi_us, Some(187.0));
        assert_eq!(reading.aqi_cn, Some(136.0));
        assert_eq!(reading.main_pollutant_us, Some(Pollutant::Pm25));
        assert_eq!(reading.temperature, Some(18.0));
        assert_eq!(reading.humidity, Some(72.0));
        assert_eq!(reading.pressure, Some(1016.0));
        assert_eq!(reading.wind_speed, Some(2.57));
        assert!(reading.timestamp.is_some());
    }

    #[test]
    fn test_failure_status_carries_message() {
        let body: CityResponse =
            serde_json::from_str(r#"{"status": "fail", "data": {"message": "city_not_found"}}"#)
                .unwrap();
        match parse_response(body) {
            Err(ProviderError::Status(message)) => assert_eq!(message, "city_not_found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_pollution_block_is_parse_error() {
        let body: CityResponse =
            serde_json::from_str(r#"{"status": "success", "data": {"current": {}}}"#).unwrap();
        assert!(matches!(parse_response(body), Err(ProviderError::ParseError(_))));
    }
}
