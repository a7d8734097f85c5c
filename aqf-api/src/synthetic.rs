//! Synthetic readings served when no provider answers
//!
//! AQI here is a quick proxy (scaled maximum of a few pollutants), not the
//! breakpoint calculation. Model-based forecasts use the India standard.

use aqf_common::{cities, AqiCalculator, AqiCategory, AqiStandard, Pollutant, PollutantReading};
use aqf_fc::HourlyPrediction;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rand::Rng;
use serde::Serialize;
use std::f64::consts::PI;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RUSH_HOURS: [u32; 6] = [7, 8, 9, 18, 19, 20];
const NIGHT_HOURS: [u32; 4] = [2, 3, 4, 5];

/// Current conditions for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticConditions {
    #[serde(flatten)]
    pub pollutants: PollutantReading,
    #[serde(rename = "AQI")]
    pub aqi: i64,
    pub category: AqiCategory,
    pub color: &'static str,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub timestamp: String,
}

/// One forecast step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub hour: u32,
    /// Abbreviated weekday, e.g. "Mon"
    pub day: String,
    /// "MM/DD"
    pub date: String,
    #[serde(flatten)]
    pub pollutants: PollutantReading,
    #[serde(rename = "AQI")]
    pub aqi: i64,
    pub category: AqiCategory,
}

/// Daily average for one past day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    pub date: String,
    #[serde(rename = "PM2.5")]
    pub pm25: f64,
    #[serde(rename = "PM10")]
    pub pm10: f64,
    #[serde(rename = "NO2")]
    pub no2: f64,
    #[serde(rename = "AQI")]
    pub aqi: i64,
    pub category: AqiCategory,
}

/// Forecast spacing: hourly up to two days, then every two hours
pub fn forecast_step(hours: u32) -> u32 {
    if hours <= 48 {
        1
    } else {
        2
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round each pollutant for display (CO to 2 decimals, others to 1)
fn rounded(pollutants: &PollutantReading) -> PollutantReading {
    pollutants
        .iter()
        .map(|(p, v)| {
            let decimals = if p == Pollutant::Co { 2 } else { 1 };
            (p, round_to(v, decimals))
        })
        .collect()
}

fn proxy_aqi(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn current_conditions(city: &str, rng: &mut impl Rng, now: NaiveDateTime) -> SyntheticConditions {
    let base = cities::baseline_pollution(city);
    let rush = if RUSH_HOURS.contains(&now.hour()) { 1.3 } else { 1.0 };

    let pm25 = (base * rush + rng.gen_range(-20.0..25.0)).max(10.0);
    let pm10 = pm25 * rng.gen_range(1.6..2.0) + rng.gen_range(-15.0..20.0);
    let no2 = base * 0.4 * rush + rng.gen_range(-12.0..15.0);
    let so2 = base * 0.2 + rng.gen_range(-8.0..10.0);
    let co = base * 0.08 + rng.gen_range(-2.0..4.0);
    let o3 = 60.0 + rng.gen_range(-25.0..35.0);

    let aqi = proxy_aqi(&[pm25 * 2.2, pm10 * 1.1, no2 * 1.8]);
    let category = AqiCategory::from_aqi(aqi);

    let pollutants: PollutantReading = [
        (Pollutant::Pm25, pm25),
        (Pollutant::Pm10, pm10),
        (Pollutant::No2, no2),
        (Pollutant::So2, so2),
        (Pollutant::Co, co),
        (Pollutant::O3, o3),
    ]
    .into_iter()
    .collect();

    SyntheticConditions {
        pollutants: rounded(&pollutants),
        aqi: aqi.round() as i64,
        category,
        color: category.color(),
        temperature: round_to(rng.gen_range(15.0..35.0), 1),
        humidity: rng.gen_range(30.0f64..85.0).round(),
        wind_speed: round_to(rng.gen_range(2.0..20.0), 1),
        pressure: round_to(rng.gen_range(995.0..1025.0), 1),
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
    }
}

fn forecast_point(timestamp: NaiveDateTime, pollutants: &PollutantReading, aqi: f64) -> ForecastPoint {
    ForecastPoint {
        timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        hour: timestamp.hour(),
        day: timestamp.format("%a").to_string(),
        date: timestamp.format("%m/%d").to_string(),
        pollutants: rounded(pollutants),
        aqi: aqi.round() as i64,
        category: AqiCategory::from_aqi(aqi),
    }
}

/// Heuristic forecast with seasonal, weekly, daily and random factors
pub fn mock_forecast(city: &str, hours: u32, rng: &mut impl Rng, now: NaiveDateTime) -> Vec<ForecastPoint> {
    let base = cities::baseline_pollution(city);
    let step = forecast_step(hours) as usize;

    (0..hours)
        .step_by(step)
        .map(|offset| {
            let timestamp = now + Duration::hours(i64::from(offset));
            let hour = timestamp.hour();
            let day_of_year = f64::from(timestamp.ordinal());

            let seasonal = 1.0 + 0.3 * (2.0 * PI * day_of_year / 365.0).sin();
            let weekend = if timestamp.weekday().num_days_from_monday() >= 5 { 0.8 } else { 1.0 };
            let daily = if RUSH_HOURS.contains(&hour) {
                1.4
            } else if NIGHT_HOURS.contains(&hour) {
                0.7
            } else {
                1.0
            };
            let factor = seasonal * weekend * daily * rng.gen_range(0.8..1.3);

            let pm25 = (base * 0.6 * factor + rng.gen_range(-15.0..20.0)).max(5.0);
            let pm10 = pm25 * rng.gen_range(1.6..2.2) + rng.gen_range(-10.0..15.0);
            let no2 = base * 0.4 * factor + rng.gen_range(-8.0..12.0);
            let so2 = base * 0.2 * factor + rng.gen_range(-5.0..8.0);
            let co = base * 0.08 * factor + rng.gen_range(-1.0..3.0);
            let o3 = 50.0 + 20.0 * (2.0 * PI * f64::from(hour) / 24.0).sin() + rng.gen_range(-15.0..25.0);

            let aqi = proxy_aqi(&[pm25 * 2.2, pm10 * 1.1, no2 * 1.8, so2 * 1.5]);
            let pollutants: PollutantReading = [
                (Pollutant::Pm25, pm25),
                (Pollutant::Pm10, pm10),
                (Pollutant::No2, no2),
                (Pollutant::So2, so2),
                (Pollutant::Co, co),
                (Pollutant::O3, o3),
            ]
            .into_iter()
            .collect();

            forecast_point(timestamp, &pollutants, aqi)
        })
        .collect()
}

/// Convert model predictions into forecast points, keeping the usual spacing
///
/// Hours whose predictions cannot be scored are reported with AQI 0.
pub fn model_forecast(predictions: &[HourlyPrediction], hours: u32) -> Vec<ForecastPoint> {
    let calculator = AqiCalculator::new(AqiStandard::India);
    let step = forecast_step(hours) as usize;

    predictions
        .iter()
        .step_by(step)
        .map(|prediction| {
            let aqi = calculator
                .calculate(&prediction.pollutants)
                .map(|r| r.aqi)
                .unwrap_or(0.0);
            forecast_point(prediction.timestamp, &prediction.pollutants, aqi)
        })
        .collect()
}

/// `days` daily records ending at `now`, oldest first
pub fn historical(city: &str, days: u32, rng: &mut impl Rng, now: NaiveDateTime) -> Vec<HistoricalPoint> {
    let base = cities::baseline_pollution(city);

    let mut records: Vec<HistoricalPoint> = (0..days)
        .map(|day| {
            let date = now - Duration::days(i64::from(day));
            let variation = rng.gen_range(0.6..1.5);

            let pm25 = (base * variation + rng.gen_range(-25.0..30.0)).max(15.0);
            let pm10 = pm25 * rng.gen_range(1.6..2.2) + rng.gen_range(-20.0..25.0);
            let no2 = base * 0.4 * variation + rng.gen_range(-15.0..18.0);
            let aqi = proxy_aqi(&[pm25 * 2.2, pm10 * 1.1, no2 * 1.8]);

            HistoricalPoint {
                date: date.format("%Y-%m-%d").to_string(),
                pm25: round_to(pm25, 1),
                pm10: round_to(pm10, 1),
                no2: round_to(no2, 1),
                aqi: aqi.round() as i64,
                category: AqiCategory::from_aqi(aqi),
            }
        })
        .collect();

    records.reverse();
    records
}
