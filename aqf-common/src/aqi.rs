//! AQI breakpoint calculation
//!
//! Maps pollutant concentrations to AQI sub-indices by piecewise-linear
//! interpolation over a breakpoint table, then aggregates with the
//! max-across-pollutants rule. The pollutant producing the maximum is the
//! dominant pollutant.
//!
//! Used by the serving path (deriving a missing AQI when reconciling provider
//! readings, model forecasts) and by the trainer's forecast report.
//!
//! # Edge cases
//!
//! - Pollutants missing from the active table are ignored.
//! - No tabled pollutant present: AQI 0, `Good`, no dominant pollutant.
//! - Negative or non-finite concentration: [`AqiError::InvalidConcentration`].
//! - Concentration above the last bracket: clamped to that bracket's upper AQI.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pollutants::{AqiCategory, Pollutant, PollutantReading};

/// AQI calculation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AqiError {
    #[error("Invalid concentration for {pollutant}: {value}")]
    InvalidConcentration { pollutant: Pollutant, value: f64 },
}

/// One interpolation bracket: `[bp_lo, bp_hi]` maps onto `[aqi_lo, aqi_hi]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub bp_lo: f64,
    pub bp_hi: f64,
    pub aqi_lo: f64,
    pub aqi_hi: f64,
}

impl Breakpoint {
    const fn new(bp_lo: f64, bp_hi: f64, aqi_lo: f64, aqi_hi: f64) -> Self {
        Self { bp_lo, bp_hi, aqi_lo, aqi_hi }
    }

    fn interpolate(&self, value: f64) -> f64 {
        self.aqi_lo + (self.aqi_hi - self.aqi_lo) * (value - self.bp_lo) / (self.bp_hi - self.bp_lo)
    }
}

/// Country standard selecting the breakpoint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiStandard {
    /// US EPA particulate tables (PM2.5, PM10)
    #[default]
    UsEpa,
    /// Indian CPCB-style bands for PM2.5, PM10 and NO2 (µg/m³)
    India,
}

type BreakpointTable = Vec<(Pollutant, Vec<Breakpoint>)>;

/// US EPA, contiguous brackets so the index never steps down at a boundary.
/// Gaseous pollutants are left out: EPA defines them in ppb/ppm.
static US_EPA_TABLE: Lazy<BreakpointTable> = Lazy::new(|| {
    vec![
        (
            Pollutant::Pm25,
            vec![
                Breakpoint::new(0.0, 12.0, 0.0, 50.0),
                Breakpoint::new(12.0, 35.4, 50.0, 100.0),
                Breakpoint::new(35.4, 55.4, 100.0, 150.0),
                Breakpoint::new(55.4, 150.4, 150.0, 200.0),
                Breakpoint::new(150.4, 250.4, 200.0, 300.0),
                Breakpoint::new(250.4, 350.4, 300.0, 400.0),
                Breakpoint::new(350.4, 500.4, 400.0, 500.0),
            ],
        ),
        (
            Pollutant::Pm10,
            vec![
                Breakpoint::new(0.0, 54.0, 0.0, 50.0),
                Breakpoint::new(54.0, 154.0, 50.0, 100.0),
                Breakpoint::new(154.0, 254.0, 100.0, 150.0),
                Breakpoint::new(254.0, 354.0, 150.0, 200.0),
                Breakpoint::new(354.0, 424.0, 200.0, 300.0),
                Breakpoint::new(424.0, 604.0, 300.0, 500.0),
            ],
        ),
    ]
});

/// Indian bands 0-50 / 51-100 / 101-200 / 201-300 / 301-400.
/// Only PM2.5, PM10 and NO2 are scored.
static INDIA_TABLE: Lazy<BreakpointTable> = Lazy::new(|| {
    fn bands(edges: [f64; 6]) -> Vec<Breakpoint> {
        const AQI: [(f64, f64); 5] = [
            (0.0, 50.0),
            (51.0, 100.0),
            (101.0, 200.0),
            (201.0, 300.0),
            (301.0, 400.0),
        ];
        AQI.iter()
            .enumerate()
            .map(|(i, (lo, hi))| Breakpoint::new(edges[i], edges[i + 1], *lo, *hi))
            .collect()
    }

    vec![
        (Pollutant::Pm25, bands([0.0, 30.0, 60.0, 90.0, 120.0, 250.0])),
        (Pollutant::Pm10, bands([0.0, 50.0, 100.0, 250.0, 350.0, 430.0])),
        (Pollutant::No2, bands([0.0, 40.0, 80.0, 180.0, 280.0, 400.0])),
    ]
});

/// Aggregated AQI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiResult {
    pub aqi: f64,
    pub category: AqiCategory,
    pub dominant_pollutant: Option<Pollutant>,
}

impl AqiResult {
    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

/// Breakpoint-table AQI calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct AqiCalculator {
    standard: AqiStandard,
}

impl AqiCalculator {
    pub fn new(standard: AqiStandard) -> Self {
        Self { standard }
    }

    pub fn standard(&self) -> AqiStandard {
        self.standard
    }

    fn table(&self) -> &'static BreakpointTable {
        match self.standard {
            AqiStandard::UsEpa => &*US_EPA_TABLE,
            AqiStandard::India => &*INDIA_TABLE,
        }
    }

    /// Pollutants covered by the active table, in table order
    pub fn pollutants(&self) -> impl Iterator<Item = Pollutant> {
        self.table().iter().map(|(p, _)| *p)
    }

    /// Sub-index for one pollutant
    ///
    /// Returns `Ok(None)` when the pollutant is not in the active table.
    pub fn sub_index(&self, pollutant: Pollutant, value: f64) -> Result<Option<f64>, AqiError> {
        let Some((_, brackets)) = self.table().iter().find(|(p, _)| *p == pollutant) else {
            return Ok(None);
        };

        if !value.is_finite() || value < 0.0 {
            return Err(AqiError::InvalidConcentration { pollutant, value });
        }

        let aqi = match brackets.iter().find(|bp| value <= bp.bp_hi) {
            Some(bracket) => bracket.interpolate(value),
            // Above the table: saturate at the top of the last bracket
            None => brackets.last().map(|bp| bp.aqi_hi).unwrap_or(0.0),
        };

        Ok(Some(aqi))
    }

    /// Worst-case AQI across all tabled pollutants present in `reading`
    ///
    /// Ties keep the first pollutant in table order.
    pub fn calculate(&self, reading: &PollutantReading) -> Result<AqiResult, AqiError> {
        let mut max_aqi = 0.0;
        let mut dominant = None;

        for pollutant in self.pollutants() {
            let Some(value) = reading.get(pollutant) else {
                continue;
            };
            if let Some(aqi) = self.sub_index(pollutant, value)? {
                if dominant.is_none() || aqi > max_aqi {
                    max_aqi = aqi;
                    dominant = Some(pollutant);
                }
            }
        }

        Ok(AqiResult {
            aqi: max_aqi,
            category: AqiCategory::from_aqi(max_aqi),
            dominant_pollutant: dominant,
        })
    }

    /// True when `reading` holds at least one pollutant this table can score
    pub fn can_score(&self, reading: &PollutantReading) -> bool {
        self.pollutants().any(|p| reading.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pm25(value: f64) -> PollutantReading {
        [(Pollutant::Pm25, value)].into_iter().collect()
    }

    #[test]
    fn test_pm25_bracket_boundary_is_exact() {
        let calc = AqiCalculator::default();
        let result = calc.calculate(&pm25(12.0)).unwrap();
        assert_eq!(result.aqi, 50.0);
        assert_eq!(result.category, AqiCategory::Good);
        assert_eq!(result.dominant_pollutant, Some(Pollutant::Pm25));
    }

    #[test]
    fn test_zero_concentration_is_zero_aqi() {
        let calc = AqiCalculator::default();
        let result = calc.calculate(&pm25(0.0)).unwrap();
        assert_eq!(result.aqi, 0.0);
        assert_eq!(result.category, AqiCategory::Good);
    }

    #[test]
    fn test_interpolation_inside_bracket() {
        let calc = AqiCalculator::default();
        // 12.0..35.4 -> 50..100
        let aqi = calc.sub_index(Pollutant::Pm25, 23.7).unwrap().unwrap();
        assert!((aqi - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_across_brackets() {
        for standard in [AqiStandard::UsEpa, AqiStandard::India] {
            let calc = AqiCalculator::new(standard);
            for pollutant in calc.pollutants().collect::<Vec<_>>() {
                let mut previous = -1.0;
                let mut value = 0.0;
                while value < 2000.0 {
                    let aqi = calc.sub_index(pollutant, value).unwrap().unwrap();
                    assert!(
                        aqi >= previous,
                        "{:?} {} not monotonic at {}: {} < {}",
                        standard, pollutant, value, aqi, previous
                    );
                    previous = aqi;
                    value += 0.25;
                }
                let top = match standard {
                    AqiStandard::UsEpa => 500.0,
                    AqiStandard::India => 400.0,
                };
                assert_eq!(previous, top, "{:?} {} saturates at {}", standard, pollutant, top);
            }
        }
    }

    #[test]
    fn test_above_table_clamps_to_top() {
        let calc = AqiCalculator::default();
        let aqi = calc.sub_index(Pollutant::Pm25, 900.0).unwrap().unwrap();
        assert_eq!(aqi, 500.0);
    }

    #[test]
    fn test_negative_concentration_rejected() {
        let calc = AqiCalculator::default();
        let err = calc.calculate(&pm25(-1.0)).unwrap_err();
        assert_eq!(
            err,
            AqiError::InvalidConcentration { pollutant: Pollutant::Pm25, value: -1.0 }
        );
        assert!(calc.sub_index(Pollutant::Pm25, f64::NAN).is_err());
    }

    #[test]
    fn test_untabled_pollutant_ignored() {
        let calc = AqiCalculator::default();
        assert_eq!(calc.sub_index(Pollutant::No2, 500.0).unwrap(), None);

        let reading: PollutantReading = [(Pollutant::No2, 500.0)].into_iter().collect();
        let result = calc.calculate(&reading).unwrap();
        assert_eq!(result.aqi, 0.0);
        assert_eq!(result.dominant_pollutant, None);
        assert!(!calc.can_score(&reading));
    }

    #[test]
    fn test_max_across_pollutants_picks_dominant() {
        let calc = AqiCalculator::new(AqiStandard::India);
        let reading: PollutantReading = [
            (Pollutant::Pm25, 20.0), // ~33
            (Pollutant::Pm10, 80.0), // ~80
            (Pollutant::No2, 100.0), // ~121
            (Pollutant::O3, 400.0),  // not scored
        ]
        .into_iter()
        .collect();

        let result = calc.calculate(&reading).unwrap();
        assert_eq!(result.dominant_pollutant, Some(Pollutant::No2));
        assert_eq!(result.category, AqiCategory::Moderate);
        assert!((result.aqi - 120.8).abs() < 1e-9);
    }

    #[test]
    fn test_india_scores_particulates_and_no2_only() {
        let calc = AqiCalculator::new(AqiStandard::India);
        assert_eq!(
            calc.pollutants().collect::<Vec<_>>(),
            vec![Pollutant::Pm25, Pollutant::Pm10, Pollutant::No2]
        );
        assert_eq!(calc.sub_index(Pollutant::O3, 80.0).unwrap(), None);

        let reading: PollutantReading = [
            (Pollutant::Pm25, 25.0),
            (Pollutant::No2, 20.0),
            (Pollutant::O3, 80.0),
            (Pollutant::So2, 500.0),
        ]
        .into_iter()
        .collect();
        let result = calc.calculate(&reading).unwrap();
        assert!((result.aqi - 125.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.category, AqiCategory::Good);
        assert_eq!(result.dominant_pollutant, Some(Pollutant::Pm25));

        let only_ozone: PollutantReading = [(Pollutant::O3, 300.0)].into_iter().collect();
        assert!(!calc.can_score(&only_ozone));
    }

    #[test]
    fn test_india_top_band_clamps_at_400() {
        let calc = AqiCalculator::new(AqiStandard::India);
        assert_eq!(calc.sub_index(Pollutant::Pm25, 250.0).unwrap(), Some(400.0));
        assert_eq!(calc.sub_index(Pollutant::Pm25, 300.0).unwrap(), Some(400.0));
        assert_eq!(calc.sub_index(Pollutant::No2, 900.0).unwrap(), Some(400.0));
    }

    #[test]
    fn test_tie_keeps_table_order() {
        let calc = AqiCalculator::new(AqiStandard::India);
        // PM2.5 30 and NO2 40 both sit exactly on the first band's top (50)
        let reading: PollutantReading =
            [(Pollutant::No2, 40.0), (Pollutant::Pm25, 30.0)].into_iter().collect();
        let result = calc.calculate(&reading).unwrap();
        assert_eq!(result.aqi, 50.0);
        assert_eq!(result.dominant_pollutant, Some(Pollutant::Pm25));
    }

    #[test]
    fn test_empty_reading() {
        let result = AqiCalculator::default().calculate(&PollutantReading::new()).unwrap();
        assert_eq!(result.aqi, 0.0);
        assert_eq!(result.category, AqiCategory::Good);
        assert_eq!(result.dominant_pollutant, None);
    }
}
