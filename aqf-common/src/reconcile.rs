//! Multi-provider reading reconciliation
//!
//! Merges the normalized readings of up to three air-quality providers into
//! one [`CombinedReading`].
//!
//! **Merge priority:**
//! 1. OpenWeatherMap supplies pollutant concentrations
//! 2. AirVisual supplies US AQI, main pollutant and weather fields
//! 3. WAQI fills only fields still absent
//! 4. A still-missing AQI is derived from the merged pollutants when the
//!    calculator can score them
//!
//! Conflicting values are never averaged: the higher-priority source wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aqi::AqiCalculator;
use crate::pollutants::{AqiCategory, Pollutant, PollutantReading};

/// Upstream data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    OpenWeather,
    AirVisual,
    Waqi,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::OpenWeather, Source::AirVisual, Source::Waqi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::OpenWeather => "openweather",
            Source::AirVisual => "airvisual",
            Source::Waqi => "waqi",
        }
    }
}

/// OpenWeatherMap air pollution reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenWeatherReading {
    pub timestamp: Option<DateTime<Utc>>,
    /// OpenWeatherMap's own 1-5 index (informational only)
    pub index: Option<u8>,
    pub pollutants: PollutantReading,
}

/// AirVisual (IQAir) city reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirVisualReading {
    pub timestamp: Option<DateTime<Utc>>,
    pub aqi_us: Option<f64>,
    pub aqi_cn: Option<f64>,
    pub main_pollutant_us: Option<Pollutant>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// World Air Quality Index feed reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaqiReading {
    pub timestamp: Option<DateTime<Utc>>,
    pub aqi: Option<f64>,
    pub pollutants: PollutantReading,
    pub dominant_pollutant: Option<Pollutant>,
    pub station_name: Option<String>,
}

/// Readings gathered for one request; absent providers are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPayloads {
    pub openweather: Option<OpenWeatherReading>,
    pub airvisual: Option<AirVisualReading>,
    pub waqi: Option<WaqiReading>,
}

impl ProviderPayloads {
    pub fn is_empty(&self) -> bool {
        self.openweather.is_none() && self.airvisual.is_none() && self.waqi.is_none()
    }
}

/// Weather fields of a combined reading
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Weather {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Provider-specific values kept alongside the merged fields
///
/// Informational only: none of these feed the merged AQI.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceDetails {
    /// OpenWeatherMap 1-5 index
    pub openweather_index: Option<u8>,
    /// AirVisual China AQI
    pub aqi_cn: Option<f64>,
    /// WAQI monitoring station
    pub station_name: Option<String>,
}

/// Normalized reading built from whichever providers answered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedReading {
    pub timestamp: DateTime<Utc>,
    pub sources_used: Vec<Source>,
    #[serde(flatten)]
    pub pollutants: PollutantReading,
    #[serde(rename = "AQI")]
    pub aqi: Option<f64>,
    /// True when AQI was computed locally rather than reported by a provider
    pub aqi_derived: bool,
    pub category: Option<AqiCategory>,
    pub color: Option<&'static str>,
    pub dominant_pollutant: Option<Pollutant>,
    #[serde(flatten)]
    pub weather: Weather,
    pub details: SourceDetails,
}

/// Applies the fixed provider priority and derives a missing AQI
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    calculator: AqiCalculator,
}

impl Reconciler {
    pub fn new(calculator: AqiCalculator) -> Self {
        Self { calculator }
    }

    /// Merge provider readings
    ///
    /// Returns `None` when every provider is absent.
    pub fn reconcile(&self, payloads: &ProviderPayloads, now: DateTime<Utc>) -> Option<CombinedReading> {
        if payloads.is_empty() {
            return None;
        }

        let mut combined = CombinedReading {
            timestamp: now,
            sources_used: Vec::new(),
            pollutants: PollutantReading::new(),
            aqi: None,
            aqi_derived: false,
            category: None,
            color: None,
            dominant_pollutant: None,
            weather: Weather::default(),
            details: SourceDetails::default(),
        };

        if let Some(ow) = &payloads.openweather {
            combined.sources_used.push(Source::OpenWeather);
            for (pollutant, value) in ow.pollutants.iter() {
                combined.pollutants.set(pollutant, value);
            }
            combined.details.openweather_index = ow.index;
        }

        if let Some(av) = &payloads.airvisual {
            combined.sources_used.push(Source::AirVisual);
            combined.aqi = av.aqi_us;
            combined.dominant_pollutant = av.main_pollutant_us;
            combined.weather = Weather {
                temperature: av.temperature,
                humidity: av.humidity,
                pressure: av.pressure,
                wind_speed: av.wind_speed,
            };
            combined.details.aqi_cn = av.aqi_cn;
        }

        if let Some(waqi) = &payloads.waqi {
            combined.sources_used.push(Source::Waqi);
            for (pollutant, value) in waqi.pollutants.iter() {
                combined.pollutants.fill(pollutant, value);
            }
            combined.aqi = combined.aqi.or(waqi.aqi);
            combined.dominant_pollutant = combined.dominant_pollutant.or(waqi.dominant_pollutant);
            combined.details.station_name = waqi.station_name.clone();
        }

        if combined.aqi.is_none() && self.calculator.can_score(&combined.pollutants) {
            match self.calculator.calculate(&combined.pollutants) {
                Ok(result) => {
                    debug!(
                        aqi = result.aqi,
                        dominant = ?result.dominant_pollutant,
                        "Derived AQI from merged pollutants"
                    );
                    combined.aqi = Some(result.aqi);
                    combined.aqi_derived = true;
                    combined.dominant_pollutant = combined.dominant_pollutant.or(result.dominant_pollutant);
                }
                Err(e) => {
                    warn!(error = %e, "Could not derive AQI from provider pollutants");
                }
            }
        }

        if let Some(aqi) = combined.aqi {
            let category = AqiCategory::from_aqi(aqi);
            combined.category = Some(category);
            combined.color = Some(category.color());
        }

        Some(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 5, 8, 0, 0).unwrap()
    }

    fn reading(values: &[(Pollutant, f64)]) -> PollutantReading {
        values.iter().copied().collect()
    }

    #[test]
    fn test_all_absent_is_none() {
        let reconciler = Reconciler::default();
        assert!(reconciler.reconcile(&ProviderPayloads::default(), now()).is_none());
    }

    #[test]
    fn test_missing_aqi_derived_from_pm25() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                pollutants: reading(&[(Pollutant::Pm25, 40.0)]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        let expected = AqiCalculator::default()
            .calculate(&reading(&[(Pollutant::Pm25, 40.0)]))
            .unwrap();

        assert_eq!(combined.aqi, Some(expected.aqi));
        assert!(combined.aqi_derived);
        assert_eq!(combined.category, Some(AqiCategory::Moderate));
        assert_eq!(combined.dominant_pollutant, Some(Pollutant::Pm25));
        assert_eq!(combined.sources_used, vec![Source::OpenWeather]);
    }

    #[test]
    fn test_higher_priority_pollutant_wins() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                pollutants: reading(&[(Pollutant::Pm25, 40.0)]),
                ..Default::default()
            }),
            waqi: Some(WaqiReading {
                pollutants: reading(&[(Pollutant::Pm25, 95.0), (Pollutant::Pm10, 120.0)]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        assert_eq!(combined.pollutants.get(Pollutant::Pm25), Some(40.0));
        // Field missing from the preferred source is filled
        assert_eq!(combined.pollutants.get(Pollutant::Pm10), Some(120.0));
    }

    #[test]
    fn test_reported_aqi_not_overridden() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                pollutants: reading(&[(Pollutant::Pm25, 400.0)]),
                ..Default::default()
            }),
            airvisual: Some(AirVisualReading {
                aqi_us: Some(62.0),
                temperature: Some(31.0),
                ..Default::default()
            }),
            waqi: Some(WaqiReading {
                aqi: Some(150.0),
                ..Default::default()
            }),
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        assert_eq!(combined.aqi, Some(62.0));
        assert!(!combined.aqi_derived);
        assert_eq!(combined.category, Some(AqiCategory::Satisfactory));
        assert_eq!(combined.weather.temperature, Some(31.0));
        assert_eq!(
            combined.sources_used,
            vec![Source::OpenWeather, Source::AirVisual, Source::Waqi]
        );
    }

    #[test]
    fn test_waqi_fills_aqi_and_dominant() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            waqi: Some(WaqiReading {
                aqi: Some(180.0),
                dominant_pollutant: Some(Pollutant::Pm10),
                ..Default::default()
            }),
            ..Default::default()
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        assert_eq!(combined.aqi, Some(180.0));
        assert_eq!(combined.dominant_pollutant, Some(Pollutant::Pm10));
        assert_eq!(combined.color, Some("#ff7e00"));
    }

    #[test]
    fn test_weather_only_leaves_aqi_absent() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            airvisual: Some(AirVisualReading {
                humidity: Some(70.0),
                ..Default::default()
            }),
            ..Default::default()
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        assert_eq!(combined.aqi, None);
        assert_eq!(combined.category, None);
        assert!(!combined.aqi_derived);
    }

    #[test]
    fn test_invalid_concentration_leaves_aqi_absent() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                pollutants: reading(&[(Pollutant::Pm25, -3.0)]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        assert_eq!(combined.aqi, None);
        assert_eq!(combined.pollutants.get(Pollutant::Pm25), Some(-3.0));
    }

    #[test]
    fn test_provider_details_preserved() {
        let reconciler = Reconciler::default();
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                index: Some(4),
                pollutants: reading(&[(Pollutant::Pm25, 40.0)]),
                ..Default::default()
            }),
            airvisual: Some(AirVisualReading {
                aqi_us: Some(112.0),
                aqi_cn: Some(81.0),
                ..Default::default()
            }),
            waqi: Some(WaqiReading {
                aqi: Some(150.0),
                station_name: Some("Bandra, Mumbai".to_string()),
                ..Default::default()
            }),
        };

        let combined = reconciler.reconcile(&payloads, now()).unwrap();
        // The merged AQI still comes from AirVisual's US figure
        assert_eq!(combined.aqi, Some(112.0));
        assert_eq!(
            combined.details,
            SourceDetails {
                openweather_index: Some(4),
                aqi_cn: Some(81.0),
                station_name: Some("Bandra, Mumbai".to_string()),
            }
        );

        let json = serde_json::to_value(&combined).unwrap();
        assert_eq!(json["details"]["openweather_index"], 4);
        assert_eq!(json["details"]["aqi_cn"], 81.0);
        assert_eq!(json["details"]["station_name"], "Bandra, Mumbai");
    }

    #[test]
    fn test_serialized_shape() {
        let payloads = ProviderPayloads {
            openweather: Some(OpenWeatherReading {
                pollutants: reading(&[(Pollutant::Pm25, 40.0)]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let combined = Reconciler::default().reconcile(&payloads, now()).unwrap();
        let json = serde_json::to_value(&combined).unwrap();

        assert_eq!(json["PM2.5"], 40.0);
        assert!(json["AQI"].is_number());
        assert_eq!(json["category"], "Moderate");
        assert_eq!(json["sources_used"][0], "openweather");
        assert!(json["temperature"].is_null());
        assert!(json["details"]["station_name"].is_null());
    }
}
