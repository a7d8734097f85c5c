//! Feature engineering for the regression models
//!
//! Preprocessing mirrors what the models see at prediction time:
//! 1. Label-encode weather condition, season and city (sorted labels)
//! 2. Derive month and day-of-year from the timestamp
//! 3. Add lag-1 and lag-24 values for every pollutant
//! 4. Drop rows whose lag window is incomplete
//! 5. Standard-scale every feature column

use aqf_common::db::TrainingRow;
use aqf_common::Pollutant;
use chrono::{Datelike, NaiveDateTime, Timelike};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::synthetic::WeatherConditions;

/// Longest lag used by the feature set
pub const MAX_LAG: usize = 24;

/// Lag values used when predicting without history
pub const DEFAULT_LAG1: f64 = 50.0;
pub const DEFAULT_LAG24: f64 = 45.0;

/// Base feature names, before the per-pollutant lag columns
const BASE_FEATURES: [&str; 12] = [
    "temperature",
    "humidity",
    "wind_speed",
    "pressure",
    "weather_encoded",
    "season_encoded",
    "city_encoded",
    "hour",
    "day_of_week",
    "is_weekend",
    "month",
    "day_of_year",
];

/// Ordered feature column names
pub fn feature_columns() -> Vec<String> {
    let mut columns: Vec<String> = BASE_FEATURES.iter().map(|s| s.to_string()).collect();
    for pollutant in Pollutant::ALL {
        columns.push(format!("{}_lag1", pollutant.as_str()));
        columns.push(format!("{}_lag24", pollutant.as_str()));
    }
    columns
}

/// Maps string labels to their index in sorted order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// Unknown labels encode as 0
    pub fn transform_or_default(&self, label: &str) -> f64 {
        self.transform(label).unwrap_or(0) as f64
    }
}

/// Encoders for the categorical columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoders {
    pub weather: LabelEncoder,
    pub season: LabelEncoder,
    pub city: LabelEncoder,
}

impl Encoders {
    pub fn fit(rows: &[TrainingRow]) -> Self {
        Self {
            weather: LabelEncoder::fit(rows.iter().map(|r| r.weather_condition.as_str())),
            season: LabelEncoder::fit(rows.iter().map(|r| r.season.as_str())),
            city: LabelEncoder::fit(rows.iter().map(|r| r.city.as_str())),
        }
    }
}

/// Per-column standardization: (x - mean) / std
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on the columns of `x`; zero-variance columns get scale 1
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());

        for column in x.axis_iter(Axis(1)) {
            let m = column.sum() / n;
            let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            mean.push(m);
            scale.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Self { mean, scale }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - self.mean[j]) / self.scale[j]);
        }
        out
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_iter(
            row.iter()
                .enumerate()
                .map(|(j, v)| (v - self.mean[j]) / self.scale[j]),
        )
    }
}

/// Feature matrix plus one target column per pollutant
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    /// Shape (rows, 6), columns in [`Pollutant::ALL`] order
    pub targets: Array2<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.x.nrows() == 0
    }

    pub fn target(&self, pollutant: Pollutant) -> Array1<f64> {
        self.targets.column(pollutant.index()).to_owned()
    }
}

/// Calendar + weather part of a feature row
fn base_features(
    encoders: &Encoders,
    timestamp: NaiveDateTime,
    city: &str,
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    pressure: f64,
    weather_condition: &str,
    season: &str,
) -> [f64; 12] {
    let day_of_week = timestamp.weekday().num_days_from_monday();
    [
        temperature,
        humidity,
        wind_speed,
        pressure,
        encoders.weather.transform_or_default(weather_condition),
        encoders.season.transform_or_default(season),
        encoders.city.transform_or_default(city),
        timestamp.hour() as f64,
        day_of_week as f64,
        if day_of_week >= 5 { 1.0 } else { 0.0 },
        timestamp.month() as f64,
        timestamp.ordinal() as f64,
    ]
}

/// Build the training dataset from raw rows
///
/// Lags follow row order, as the rows are an hourly sequence.
pub fn preprocess(rows: &[TrainingRow], encoders: &Encoders) -> Dataset {
    let n_features = feature_columns().len();
    let usable = rows.len().saturating_sub(MAX_LAG);

    let mut x = Array2::<f64>::zeros((usable, n_features));
    let mut targets = Array2::<f64>::zeros((usable, Pollutant::ALL.len()));

    for (out_idx, i) in (MAX_LAG..rows.len()).enumerate() {
        let row = &rows[i];
        let base = base_features(
            encoders,
            row.timestamp,
            &row.city,
            row.temperature,
            row.humidity,
            row.wind_speed,
            row.pressure,
            &row.weather_condition,
            &row.season,
        );

        let mut features = x.row_mut(out_idx);
        for (j, value) in base.iter().enumerate() {
            features[j] = *value;
        }
        for (k, pollutant) in Pollutant::ALL.iter().enumerate() {
            features[BASE_FEATURES.len() + 2 * k] = rows[i - 1].concentration(*pollutant);
            features[BASE_FEATURES.len() + 2 * k + 1] = rows[i - MAX_LAG].concentration(*pollutant);
            targets[[out_idx, k]] = row.concentration(*pollutant);
        }
    }

    Dataset { x, targets }
}

/// Feature row for a future hour, with default lag values
pub fn prediction_features(
    encoders: &Encoders,
    timestamp: NaiveDateTime,
    city: &str,
    conditions: &WeatherConditions,
) -> Array1<f64> {
    let base = base_features(
        encoders,
        timestamp,
        city,
        conditions.temperature,
        conditions.humidity,
        conditions.wind_speed,
        conditions.pressure,
        &conditions.weather_condition,
        &conditions.season,
    );

    let mut features: Vec<f64> = base.to_vec();
    for _ in Pollutant::ALL {
        features.push(DEFAULT_LAG1);
        features.push(DEFAULT_LAG24);
    }
    Array1::from_vec(features)
}

/// Shuffled train/test index split
///
/// The test set holds `ceil(n * test_fraction)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_training_rows;
    use ndarray::array;

    #[test]
    fn test_label_encoder_sorts_classes() {
        let encoder = LabelEncoder::fit(["Rainy", "Clear", "Foggy", "Clear"]);
        assert_eq!(encoder.classes(), &["Clear", "Foggy", "Rainy"]);
        assert_eq!(encoder.transform("Foggy"), Some(1));
        assert_eq!(encoder.transform("Hail"), None);
        assert_eq!(encoder.transform_or_default("Hail"), 0.0);
    }

    #[test]
    fn test_scaler_zero_variance_guard() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.mean, vec![2.0, 5.0]);
        assert_eq!(scaler.scale, vec![1.0, 1.0]);

        let scaled = scaler.transform(&x);
        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_preprocess_drops_incomplete_lags() {
        let rows = generate_training_rows(100, 42);
        let encoders = Encoders::fit(&rows);
        let dataset = preprocess(&rows, &encoders);

        assert_eq!(dataset.len(), 100 - MAX_LAG);
        assert_eq!(dataset.x.ncols(), feature_columns().len());
        assert_eq!(dataset.targets.ncols(), 6);

        // First dataset row is raw row 24: lag1 = row 23, lag24 = row 0
        let pm25_lag1 = dataset.x[[0, 12]];
        let pm25_lag24 = dataset.x[[0, 13]];
        assert_eq!(pm25_lag1, rows[23].concentration(Pollutant::Pm25));
        assert_eq!(pm25_lag24, rows[0].concentration(Pollutant::Pm25));
        assert_eq!(dataset.targets[[0, 0]], rows[24].concentration(Pollutant::Pm25));
    }

    #[test]
    fn test_preprocess_too_few_rows() {
        let rows = generate_training_rows(10, 42);
        let dataset = preprocess(&rows, &Encoders::fit(&rows));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_prediction_features_layout() {
        let rows = generate_training_rows(50, 42);
        let encoders = Encoders::fit(&rows);
        let ts = NaiveDateTime::parse_from_str("2024-03-09 18:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let features = prediction_features(&encoders, ts, "Delhi", &WeatherConditions::default());
        assert_eq!(features.len(), feature_columns().len());
        assert_eq!(features[7], 18.0); // hour
        assert_eq!(features[9], 1.0); // Saturday
        assert_eq!(features[10], 3.0); // month
        assert_eq!(features[12], DEFAULT_LAG1);
        assert_eq!(features[13], DEFAULT_LAG24);
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let (train, test) = train_test_split(101, 0.2, 42);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }
}
