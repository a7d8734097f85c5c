//! Health recommendations keyed by AQI

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecommendation {
    pub level: &'static str,
    pub color: &'static str,
    pub message: &'static str,
    pub activities: Vec<&'static str>,
    pub precautions: Vec<&'static str>,
}

/// Advice for an AQI value (bands ≤50, ≤100, ≤200, above)
pub fn for_aqi(aqi: f64) -> HealthRecommendation {
    if aqi <= 50.0 {
        HealthRecommendation {
            level: "Good",
            color: "green",
            message: "Air quality is excellent. Perfect for all outdoor activities.",
            activities: vec!["Running", "Cycling", "Outdoor Sports", "Walking"],
            precautions: vec![],
        }
    } else if aqi <= 100.0 {
        HealthRecommendation {
            level: "Satisfactory",
            color: "yellow",
            message: "Air quality is acceptable for most people.",
            activities: vec!["Light Exercise", "Walking", "Outdoor Dining"],
            precautions: vec!["Sensitive individuals should limit prolonged outdoor exposure"],
        }
    } else if aqi <= 200.0 {
        HealthRecommendation {
            level: "Moderate",
            color: "orange",
            message: "Air quality is unhealthy for sensitive groups.",
            activities: vec!["Indoor Exercise", "Short Walks", "Avoid Strenuous Activity"],
            precautions: vec!["Wear masks outdoors", "Limit outdoor time", "Keep windows closed"],
        }
    } else {
        HealthRecommendation {
            level: "Unhealthy",
            color: "red",
            message: "Air quality is unhealthy for all people.",
            activities: vec!["Stay Indoors", "Use Air Purifiers", "Avoid Outdoor Activities"],
            precautions: vec![
                "Wear N95 masks if going outside",
                "Consult doctor if breathing issues",
                "Keep all windows closed",
            ],
        }
    }
}

/// One-line advice printed in forecast reports
pub fn summary_line(aqi: f64) -> &'static str {
    if aqi <= 50.0 {
        "Air quality is good. Enjoy outdoor activities!"
    } else if aqi <= 100.0 {
        "Air quality is satisfactory. Sensitive individuals should limit outdoor exposure."
    } else if aqi <= 200.0 {
        "Air quality is moderate. Consider reducing outdoor activities."
    } else {
        "Air quality is poor. Avoid outdoor activities. Use air purifiers indoors."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(for_aqi(50.0).level, "Good");
        assert!(for_aqi(50.0).precautions.is_empty());
        assert_eq!(for_aqi(51.0).level, "Satisfactory");
        assert_eq!(for_aqi(200.0).level, "Moderate");
        assert_eq!(for_aqi(201.0).level, "Unhealthy");
        assert_eq!(for_aqi(450.0).precautions.len(), 3);
    }
}
