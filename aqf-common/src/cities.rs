//! Supported city catalog
//!
//! Coordinates feed OpenWeatherMap, the state name feeds AirVisual, and the
//! baseline pollution level shapes every synthetic generator.

use serde::Serialize;

/// Baseline pollution used for cities outside the catalog
pub const DEFAULT_BASELINE: f64 = 75.0;

/// Country passed to AirVisual for every catalog city
pub const COUNTRY: &str = "India";

/// One supported city
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    pub name: &'static str,
    pub icon: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    /// State name as AirVisual expects it
    pub state: &'static str,
    /// Typical PM-scale pollution level
    pub baseline: f64,
}

pub const CITIES: [City; 6] = [
    City {
        name: "Mumbai",
        icon: "🏙️",
        latitude: 19.0760,
        longitude: 72.8777,
        state: "Maharashtra",
        baseline: 80.0,
    },
    City {
        name: "Delhi",
        icon: "🏛️",
        latitude: 28.7041,
        longitude: 77.1025,
        state: "Delhi",
        baseline: 150.0,
    },
    City {
        name: "Bangalore",
        icon: "🌆",
        latitude: 12.9716,
        longitude: 77.5946,
        state: "Karnataka",
        baseline: 60.0,
    },
    City {
        name: "Chennai",
        icon: "🏖️",
        latitude: 13.0827,
        longitude: 80.2707,
        state: "Tamil Nadu",
        baseline: 70.0,
    },
    City {
        name: "Kolkata",
        icon: "🌉",
        latitude: 22.5726,
        longitude: 88.3639,
        state: "West Bengal",
        baseline: 100.0,
    },
    City {
        name: "Hyderabad",
        icon: "🏰",
        latitude: 17.3850,
        longitude: 78.4867,
        state: "Telangana",
        baseline: 75.0,
    },
];

/// Look up a catalog city by exact name
pub fn find(name: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.name == name)
}

/// Baseline pollution for `name`, falling back to [`DEFAULT_BASELINE`]
pub fn baseline_pollution(name: &str) -> f64 {
    find(name).map(|c| c.baseline).unwrap_or(DEFAULT_BASELINE)
}

/// Catalog city names in catalog order
pub fn names() -> impl Iterator<Item = &'static str> {
    CITIES.iter().map(|c| c.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city_baseline() {
        assert_eq!(baseline_pollution("Delhi"), 150.0);
        assert_eq!(baseline_pollution("Bangalore"), 60.0);
    }

    #[test]
    fn test_unknown_city_uses_default_baseline() {
        assert_eq!(baseline_pollution("Atlantis"), DEFAULT_BASELINE);
        assert!(find("Atlantis").is_none());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(find("mumbai").is_none());
        assert_eq!(find("Mumbai").map(|c| c.state), Some("Maharashtra"));
    }
}
