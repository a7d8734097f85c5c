//! Pollutant and air-quality category types
//!
//! Pollutant ordering is significant: it is the iteration order of every
//! breakpoint table and therefore the tie-break order for the dominant
//! pollutant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Tracked pollutants, in breakpoint-table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O3")]
    O3,
}

impl Pollutant {
    /// All pollutants in table order
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    /// Display name used in JSON payloads ("PM2.5", "NO2", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
        }
    }

    /// Position in [`Pollutant::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Column-safe name ("pm25", "no2", ...) used for SQLite columns and feature names
    pub fn column_name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
            Pollutant::O3 => "o3",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = Error;

    /// Accepts display names and the provider spellings
    /// (`pm2_5`, `pm25`, `p2` from AirVisual's `mainus`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm2.5" | "pm2_5" | "pm25" | "p2" => Ok(Pollutant::Pm25),
            "pm10" | "p1" => Ok(Pollutant::Pm10),
            "no2" | "n2" => Ok(Pollutant::No2),
            "so2" | "s2" => Ok(Pollutant::So2),
            "co" => Ok(Pollutant::Co),
            "o3" => Ok(Pollutant::O3),
            other => Err(Error::InvalidInput(format!("Unknown pollutant: {}", other))),
        }
    }
}

/// Pollutant name → concentration (µg/m³)
///
/// Backed by a `BTreeMap` so iteration follows table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollutantReading(BTreeMap<Pollutant, f64>);

impl PollutantReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.0.get(&pollutant).copied()
    }

    pub fn contains(&self, pollutant: Pollutant) -> bool {
        self.0.contains_key(&pollutant)
    }

    /// Set a concentration, replacing any existing value
    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        self.0.insert(pollutant, value);
    }

    /// Set a concentration only when none is present yet
    ///
    /// Returns true when the value was taken.
    pub fn fill(&mut self, pollutant: Pollutant, value: f64) -> bool {
        if self.0.contains_key(&pollutant) {
            return false;
        }
        self.0.insert(pollutant, value);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }
}

impl FromIterator<(Pollutant, f64)> for PollutantReading {
    fn from_iter<I: IntoIterator<Item = (Pollutant, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Air quality category, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl AqiCategory {
    /// Map an AQI value to its category (inclusive upper bounds 50/100/200/300)
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiCategory::Good
        } else if aqi <= 100.0 {
            AqiCategory::Satisfactory
        } else if aqi <= 200.0 {
            AqiCategory::Moderate
        } else if aqi <= 300.0 {
            AqiCategory::Poor
        } else {
            AqiCategory::VeryPoor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
        }
    }

    /// Hex color shown by the frontend
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00e400",
            AqiCategory::Satisfactory => "#ffff00",
            AqiCategory::Moderate => "#ff7e00",
            AqiCategory::Poor => "#ff0000",
            AqiCategory::VeryPoor => "#8f3f97",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AqiCategory::from_aqi(0.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51.0), AqiCategory::Satisfactory);
        assert_eq!(AqiCategory::from_aqi(100.0), AqiCategory::Satisfactory);
        assert_eq!(AqiCategory::from_aqi(101.0), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(200.0), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(201.0), AqiCategory::Poor);
        assert_eq!(AqiCategory::from_aqi(300.0), AqiCategory::Poor);
        assert_eq!(AqiCategory::from_aqi(301.0), AqiCategory::VeryPoor);
    }

    #[test]
    fn test_category_serializes_with_display_label() {
        let json = serde_json::to_string(&AqiCategory::VeryPoor).unwrap();
        assert_eq!(json, "\"Very Poor\"");
    }

    #[test]
    fn test_pollutant_parse_provider_spellings() {
        assert_eq!("pm2_5".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert_eq!("pm25".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert_eq!("PM2.5".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert_eq!("p1".parse::<Pollutant>().unwrap(), Pollutant::Pm10);
        assert!("nh3".parse::<Pollutant>().is_err());
    }

    #[test]
    fn test_reading_fill_keeps_existing_value() {
        let mut reading = PollutantReading::new();
        reading.set(Pollutant::Pm25, 40.0);

        assert!(!reading.fill(Pollutant::Pm25, 90.0));
        assert!(reading.fill(Pollutant::Pm10, 70.0));
        assert_eq!(reading.get(Pollutant::Pm25), Some(40.0));
        assert_eq!(reading.get(Pollutant::Pm10), Some(70.0));
    }

    #[test]
    fn test_reading_serializes_as_named_map() {
        let reading: PollutantReading =
            [(Pollutant::No2, 12.5), (Pollutant::Pm25, 40.0)].into_iter().collect();
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["PM2.5"], 40.0);
        assert_eq!(json["NO2"], 12.5);
    }
}
