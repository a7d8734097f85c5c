//! Synthetic training data
//!
//! Hourly observations shaped by city baseline, season, rush hours, weekends,
//! weather and wind. Generation is seeded so repeated training runs see the
//! same data set.

use aqf_common::cities::{self, CITIES};
use aqf_common::db::TrainingRow;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp1, StandardNormal};
use serde::{Deserialize, Serialize};

/// Weather conditions present in the training data
pub const WEATHER_CONDITIONS: [&str; 5] = ["Clear", "Cloudy", "Rainy", "Foggy", "Stormy"];

/// Hours with extra traffic in the training data
const TRAINING_RUSH_HOURS: [u32; 4] = [7, 8, 18, 19];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Monsoon,
}

impl Season {
    /// Indian seasons: Dec-Feb winter, Mar-May spring, Jun-Sep monsoon, Oct-Nov summer
    pub fn for_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=9 => Season::Monsoon,
            _ => Season::Summer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Monsoon => "Monsoon",
        }
    }

    fn pollution_multiplier(&self) -> f64 {
        match self {
            Season::Winter => 1.5,
            Season::Spring => 1.0,
            Season::Summer => 1.2,
            Season::Monsoon => 0.7,
        }
    }

    /// (temperature °C, humidity %) bases used for training rows
    fn training_climate(&self) -> (f64, f64) {
        match self {
            Season::Winter => (15.0, 70.0),
            Season::Spring => (25.0, 60.0),
            Season::Monsoon => (28.0, 85.0),
            Season::Summer => (35.0, 45.0),
        }
    }

    /// (temperature °C, humidity %) bases used for live mock conditions
    fn current_climate(&self) -> (f64, f64) {
        match self {
            Season::Winter => (18.0, 70.0),
            Season::Spring => (28.0, 55.0),
            Season::Monsoon => (30.0, 85.0),
            Season::Summer => (35.0, 45.0),
        }
    }
}

fn weather_multiplier(condition: &str) -> f64 {
    match condition {
        "Cloudy" => 1.1,
        "Rainy" => 0.6,
        "Foggy" => 1.4,
        "Stormy" => 0.7,
        _ => 1.0,
    }
}

fn normal(rng: &mut impl Rng, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}

fn exponential(rng: &mut impl Rng, mean: f64) -> f64 {
    let e: f64 = rng.sample(Exp1);
    e * mean
}

/// First timestamp of every generated data set
pub fn training_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Generate `count` hourly rows starting at [`training_start`]
pub fn generate_training_rows(count: usize, seed: u64) -> Vec<TrainingRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = training_start();

    (0..count)
        .map(|i| generate_row(&mut rng, start + Duration::hours(i as i64)))
        .collect()
}

fn generate_row(rng: &mut StdRng, timestamp: NaiveDateTime) -> TrainingRow {
    let city = CITIES
        .choose(rng)
        .map(|c| c.name)
        .unwrap_or("Mumbai");
    let hour = timestamp.hour();
    let day_of_week = timestamp.weekday().num_days_from_monday();
    let is_weekend = day_of_week >= 5;

    let season = Season::for_month(timestamp.month());
    let (temp_base, humidity_base) = season.training_climate();

    let temperature = temp_base + normal(rng, 5.0);
    let humidity = (humidity_base + normal(rng, 15.0)).clamp(20.0, 100.0);
    let wind_speed = exponential(rng, 8.0).max(0.0);
    let pressure = 1013.0 + normal(rng, 20.0);
    let weather_condition = WEATHER_CONDITIONS
        .choose(rng)
        .copied()
        .unwrap_or("Clear");

    let rush_hour_mult = if TRAINING_RUSH_HOURS.contains(&hour) { 1.3 } else { 1.0 };
    let weekend_mult = if is_weekend { 0.8 } else { 1.0 };
    let wind_mult = (1.2 - wind_speed / 20.0).max(0.5);

    let pollution_factor = cities::baseline_pollution(city)
        * season.pollution_multiplier()
        * rush_hour_mult
        * weekend_mult
        * weather_multiplier(weather_condition)
        * wind_mult;

    let pm25 = (pollution_factor * 0.6 + normal(rng, 15.0)).max(0.0);
    let pm10 = (pm25 * 1.8 + normal(rng, 20.0)).max(0.0);
    let no2 = (pollution_factor * 0.4 + normal(rng, 10.0)).max(0.0);
    let so2 = (pollution_factor * 0.2 + normal(rng, 8.0)).max(0.0);
    let co = (pollution_factor * 0.1 + normal(rng, 5.0)).max(0.0);
    let o3 = (60.0 + (temperature - 25.0) * 2.0 + normal(rng, 15.0)).max(0.0);

    TrainingRow {
        timestamp,
        city: city.to_string(),
        concentrations: [pm25, pm10, no2, so2, co, o3],
        temperature,
        humidity,
        wind_speed,
        pressure,
        weather_condition: weather_condition.to_string(),
        season: season.as_str().to_string(),
        hour,
        day_of_week,
        is_weekend,
    }
}

/// Weather inputs for future predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub weather_condition: String,
    pub season: String,
}

impl Default for WeatherConditions {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 60.0,
            wind_speed: 10.0,
            pressure: 1013.0,
            weather_condition: "Clear".to_string(),
            season: Season::Winter.as_str().to_string(),
        }
    }
}

impl WeatherConditions {
    /// Plausible conditions for `month`, used when no live weather is available
    pub fn seasonal(month: u32, rng: &mut impl Rng) -> Self {
        let season = Season::for_month(month);
        let (temp_base, humidity_base) = season.current_climate();

        Self {
            temperature: temp_base + rng.gen_range(-5.0..5.0),
            humidity: (humidity_base + rng.gen_range(-15.0..15.0)).clamp(30.0, 90.0),
            wind_speed: exponential(rng, 8.0).max(1.0),
            pressure: 1013.0 + rng.gen_range(-20.0..20.0),
            weather_condition: ["Clear", "Cloudy"]
                .choose(rng)
                .copied()
                .unwrap_or("Clear")
                .to_string(),
            season: season.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqf_common::Pollutant;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_training_rows(50, 42);
        let b = generate_training_rows(50, 42);
        assert_eq!(a, b);

        let c = generate_training_rows(50, 7);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rows_are_hourly_from_start() {
        let rows = generate_training_rows(30, 42);
        assert_eq!(rows[0].timestamp, training_start());
        assert_eq!(rows[25].hour, 1);
        assert_eq!(rows[25].timestamp - rows[24].timestamp, Duration::hours(1));
        // 2020-01-01 was a Wednesday
        assert_eq!(rows[0].day_of_week, 2);
        assert!(!rows[0].is_weekend);
        assert_eq!(rows[0].season, "Winter");
    }

    #[test]
    fn test_values_within_bounds() {
        for row in generate_training_rows(500, 42) {
            for p in Pollutant::ALL {
                assert!(row.concentration(p) >= 0.0);
            }
            assert!((20.0..=100.0).contains(&row.humidity));
            assert!(row.wind_speed >= 0.0);
            assert!(WEATHER_CONDITIONS.contains(&row.weather_condition.as_str()));
            assert!(cities::find(&row.city).is_some());
        }
    }

    #[test]
    fn test_season_for_month() {
        assert_eq!(Season::for_month(1), Season::Winter);
        assert_eq!(Season::for_month(4), Season::Spring);
        assert_eq!(Season::for_month(7), Season::Monsoon);
        assert_eq!(Season::for_month(10), Season::Summer);
        assert_eq!(Season::for_month(12), Season::Winter);
    }

    #[test]
    fn test_seasonal_conditions_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for month in 1..=12 {
            let c = WeatherConditions::seasonal(month, &mut rng);
            assert!((30.0..=90.0).contains(&c.humidity));
            assert!(c.wind_speed >= 1.0);
            assert_eq!(c.season, Season::for_month(month).as_str());
        }
    }
}
