//! Text forecast report printed by the CLI

use aqf_common::{recommendations, AqiCalculator, AqiResult, AqiStandard, Pollutant};
use chrono::NaiveDateTime;
use std::fmt;

use crate::error::{ForecastError, ForecastResult};
use crate::forecaster::HourlyPrediction;

#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub city: String,
    pub generated_at: NaiveDateTime,
    pub hours: usize,
    /// First predicted hour, standing in for current conditions
    pub current: HourlyPrediction,
    pub current_aqi: AqiResult,
    /// Hours from now until the highest AQI (first occurrence)
    pub peak_hour: usize,
    pub peak_aqi: f64,
}

impl ForecastReport {
    /// Summarize predictions with the India standard
    pub fn build(
        city: &str,
        generated_at: NaiveDateTime,
        predictions: &[HourlyPrediction],
    ) -> ForecastResult<Self> {
        let calculator = AqiCalculator::new(AqiStandard::India);

        let current = predictions
            .first()
            .cloned()
            .ok_or(ForecastError::InsufficientData(0))?;
        let current_aqi = calculator
            .calculate(&current.pollutants)
            .map_err(|e| ForecastError::Common(aqf_common::Error::InvalidInput(e.to_string())))?;

        let mut peak_hour = 0;
        let mut peak_aqi = f64::NEG_INFINITY;
        for (hour, prediction) in predictions.iter().enumerate() {
            let aqi = calculator
                .calculate(&prediction.pollutants)
                .map(|r| r.aqi)
                .unwrap_or(0.0);
            if aqi > peak_aqi {
                peak_aqi = aqi;
                peak_hour = hour;
            }
        }

        Ok(Self {
            city: city.to_string(),
            generated_at,
            hours: predictions.len(),
            current,
            current_aqi,
            peak_hour,
            peak_aqi,
        })
    }
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== AIR POLLUTION FORECAST REPORT ===")?;
        writeln!(f, "City: {}", self.city)?;
        writeln!(f, "Generated at: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Forecast period: Next {} hours", self.hours)?;
        writeln!(f, "{}", "=".repeat(50))?;

        writeln!(f)?;
        writeln!(f, "CURRENT CONDITIONS:")?;
        writeln!(
            f,
            "AQI: {:.0} ({})",
            self.current_aqi.aqi, self.current_aqi.category
        )?;
        match self.current_aqi.dominant_pollutant {
            Some(p) => writeln!(f, "Dominant Pollutant: {}", p)?,
            None => writeln!(f, "Dominant Pollutant: none")?,
        }

        writeln!(f)?;
        writeln!(f, "POLLUTANT LEVELS:")?;
        for pollutant in Pollutant::ALL {
            if let Some(value) = self.current.pollutants.get(pollutant) {
                writeln!(f, "  {}: {:.1} μg/m³", pollutant, value)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "FORECAST HIGHLIGHTS:")?;
        writeln!(
            f,
            "Peak pollution expected in {} hours (AQI: {:.0})",
            self.peak_hour, self.peak_aqi
        )?;

        writeln!(f)?;
        writeln!(f, "HEALTH RECOMMENDATIONS:")?;
        writeln!(f, "- {}", recommendations::summary_line(self.current_aqi.aqi))
    }
}
