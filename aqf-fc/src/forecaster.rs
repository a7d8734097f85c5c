//! Per-pollutant forecaster: training, persistence and prediction
//!
//! Training fits a random forest, a gradient-boosting ensemble and a linear
//! regression for every pollutant on the same shuffled split, and keeps the
//! model with the highest test R². Everything needed for prediction
//! (encoders, scaler, feature layout, models) is stored in one JSON artifact.

use aqf_common::config::TrainingSettings;
use aqf_common::db::TrainingRow;
use aqf_common::{Pollutant, PollutantReading};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ForecastError, ForecastResult};
use crate::features::{
    feature_columns, prediction_features, preprocess, train_test_split, Encoders, StandardScaler,
};
use crate::metrics::Scores;
use crate::models::{
    BoostingParams, ForestParams, GradientBoosting, LinearRegression, ModelKind, RandomForest,
    Regressor, TrainedModel,
};
use crate::synthetic::WeatherConditions;

/// Bumped whenever the artifact layout changes
pub const ARTIFACT_VERSION: u32 = 1;

/// Fewest usable rows (after lag trimming) worth training on
pub const MIN_TRAINING_ROWS: usize = 20;

/// Predicted concentrations for one future hour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPrediction {
    pub timestamp: NaiveDateTime,
    pub pollutants: PollutantReading,
}

/// Test-set scores of one candidate model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelScore {
    pub model: ModelKind,
    #[serde(flatten)]
    pub scores: Scores,
}

/// Candidates and winner for one pollutant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantTraining {
    pub pollutant: Pollutant,
    pub candidates: Vec<ModelScore>,
    pub best: ModelKind,
    pub best_r2: f64,
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub total_rows: usize,
    pub usable_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub pollutants: Vec<PollutantTraining>,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trained on {} rows ({} usable, {} train / {} test)",
            self.total_rows, self.usable_rows, self.train_rows, self.test_rows
        )?;
        for result in &self.pollutants {
            writeln!(f)?;
            writeln!(f, "{}:", result.pollutant)?;
            for candidate in &result.candidates {
                writeln!(
                    f,
                    "  {:<18} MAE = {:>7.2}  RMSE = {:>7.2}  R² = {:>6.3}",
                    candidate.model.as_str(),
                    candidate.scores.mae,
                    candidate.scores.rmse,
                    candidate.scores.r2
                )?;
            }
            writeln!(f, "  Best: {} (R² = {:.3})", result.best, result.best_r2)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecaster {
    version: u32,
    trained_at: DateTime<Utc>,
    encoders: Encoders,
    scaler: StandardScaler,
    feature_columns: Vec<String>,
    models: BTreeMap<Pollutant, TrainedModel>,
}

impl Forecaster {
    /// Fit all candidate models and keep the best per pollutant
    pub fn train(
        rows: &[TrainingRow],
        settings: &TrainingSettings,
    ) -> ForecastResult<(Self, TrainingSummary)> {
        let encoders = Encoders::fit(rows);
        let dataset = preprocess(rows, &encoders);
        if dataset.len() < MIN_TRAINING_ROWS {
            return Err(ForecastError::InsufficientData(dataset.len()));
        }

        let scaler = StandardScaler::fit(&dataset.x);
        let x = scaler.transform(&dataset.x);

        let (train_idx, test_idx) =
            train_test_split(dataset.len(), settings.test_fraction, settings.seed);
        let x_train = x.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);

        info!(
            rows = rows.len(),
            usable = dataset.len(),
            train = train_idx.len(),
            test = test_idx.len(),
            features = x.ncols(),
            "Training forecasting models"
        );

        let mut models = BTreeMap::new();
        let mut results = Vec::with_capacity(Pollutant::ALL.len());

        for pollutant in Pollutant::ALL {
            let y = dataset.target(pollutant);
            let y_train = y.select(Axis(0), &train_idx);
            let y_test = y.select(Axis(0), &test_idx);

            let mut candidates = Vec::with_capacity(ModelKind::ALL.len());
            let mut best: Option<(TrainedModel, f64)> = None;

            for kind in ModelKind::ALL {
                let model = match fit_model(kind, &x_train, y_train.view(), settings) {
                    Ok(model) => model,
                    Err(e) => {
                        warn!(%pollutant, model = %kind, error = %e, "Model fit failed, skipping");
                        continue;
                    }
                };

                let predicted = model.predict(&x_test);
                let scores = Scores::compute(y_test.view(), predicted.view());
                info!(
                    %pollutant,
                    model = %kind,
                    mae = scores.mae,
                    rmse = scores.rmse,
                    r2 = scores.r2,
                    "Model evaluated"
                );
                candidates.push(ModelScore { model: kind, scores });

                if best.as_ref().map_or(true, |(_, r2)| scores.r2 > *r2) {
                    best = Some((model, scores.r2));
                }
            }

            let Some((model, best_r2)) = best else {
                return Err(ForecastError::InsufficientData(train_idx.len()));
            };
            info!(%pollutant, best = %model.kind(), r2 = best_r2, "Selected model");

            results.push(PollutantTraining {
                pollutant,
                candidates,
                best: model.kind(),
                best_r2,
            });
            models.insert(pollutant, model);
        }

        let forecaster = Self {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            encoders,
            scaler,
            feature_columns: feature_columns(),
            models,
        };
        let summary = TrainingSummary {
            total_rows: rows.len(),
            usable_rows: dataset.len(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            pollutants: results,
        };

        Ok((forecaster, summary))
    }

    /// Write the artifact as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ForecastResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved model artifact");
        Ok(())
    }

    /// Read an artifact and check it matches the current feature layout
    pub fn load(path: &Path) -> ForecastResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let forecaster: Self = serde_json::from_str(&content)?;
        forecaster.validate()?;
        debug!(
            path = %path.display(),
            trained_at = %forecaster.trained_at,
            "Loaded model artifact"
        );
        Ok(forecaster)
    }

    fn validate(&self) -> ForecastResult<()> {
        if self.version != ARTIFACT_VERSION {
            return Err(ForecastError::InvalidArtifact(format!(
                "version {} (expected {})",
                self.version, ARTIFACT_VERSION
            )));
        }
        if self.feature_columns != feature_columns() {
            return Err(ForecastError::InvalidArtifact(
                "feature columns do not match".to_string(),
            ));
        }
        let n = self.feature_columns.len();
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Err(ForecastError::InvalidArtifact(format!(
                "scaler has {} columns (expected {})",
                self.scaler.mean.len(),
                n
            )));
        }
        if self.models.is_empty() {
            return Err(ForecastError::InvalidArtifact("no models".to_string()));
        }
        Ok(())
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Selected model kind per pollutant
    pub fn model_kinds(&self) -> BTreeMap<Pollutant, ModelKind> {
        self.models.iter().map(|(p, m)| (*p, m.kind())).collect()
    }

    /// Predict concentrations for one unscaled feature row (clamped at 0)
    pub fn predict(&self, features: ArrayView1<f64>) -> ForecastResult<PollutantReading> {
        if features.len() != self.feature_columns.len() {
            return Err(ForecastError::InvalidArtifact(format!(
                "feature row has {} values (expected {})",
                features.len(),
                self.feature_columns.len()
            )));
        }
        let scaled = self.scaler.transform_row(features);
        Ok(self
            .models
            .iter()
            .map(|(pollutant, model)| (*pollutant, model.predict_row(scaled.view()).max(0.0)))
            .collect())
    }

    /// Hourly predictions for `hours` hours starting at `start`
    ///
    /// Lag features use fixed defaults since no live history is kept.
    pub fn predict_future(
        &self,
        city: &str,
        hours: u32,
        conditions: &WeatherConditions,
        start: NaiveDateTime,
    ) -> ForecastResult<Vec<HourlyPrediction>> {
        (0..hours)
            .map(|h| {
                let timestamp = start + Duration::hours(i64::from(h));
                let features = prediction_features(&self.encoders, timestamp, city, conditions);
                Ok(HourlyPrediction {
                    timestamp,
                    pollutants: self.predict(features.view())?,
                })
            })
            .collect()
    }
}

fn fit_model(
    kind: ModelKind,
    x: &Array2<f64>,
    y: ArrayView1<f64>,
    settings: &TrainingSettings,
) -> ForecastResult<TrainedModel> {
    let model = match kind {
        ModelKind::RandomForest => TrainedModel::RandomForest(RandomForest::fit(
            x,
            y,
            &ForestParams {
                n_trees: settings.forest_trees,
                max_depth: settings.max_depth,
                min_samples_leaf: settings.min_samples_leaf,
                seed: settings.seed,
            },
        )),
        ModelKind::GradientBoosting => TrainedModel::GradientBoosting(GradientBoosting::fit(
            x,
            y,
            &BoostingParams {
                n_trees: settings.boosting_trees,
                learning_rate: settings.learning_rate,
                max_depth: settings.max_depth,
                min_samples_leaf: settings.min_samples_leaf,
                seed: settings.seed,
            },
        )),
        ModelKind::LinearRegression => TrainedModel::LinearRegression(LinearRegression::fit(x, y)?),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::generate_training_rows;

    fn small_settings() -> TrainingSettings {
        TrainingSettings {
            records: 400,
            forest_trees: 4,
            boosting_trees: 8,
            max_depth: 4,
            min_samples_leaf: 5,
            ..TrainingSettings::default()
        }
    }

    #[test]
    fn test_train_selects_model_per_pollutant() {
        let rows = generate_training_rows(400, 42);
        let (forecaster, summary) = Forecaster::train(&rows, &small_settings()).unwrap();

        assert_eq!(summary.total_rows, 400);
        assert_eq!(summary.usable_rows, 376);
        assert_eq!(summary.test_rows, 76);
        assert_eq!(summary.train_rows, 300);
        assert_eq!(summary.pollutants.len(), 6);
        assert_eq!(forecaster.model_kinds().len(), 6);

        for result in &summary.pollutants {
            assert_eq!(result.candidates.len(), 3);
            let max_r2 = result
                .candidates
                .iter()
                .map(|c| c.scores.r2)
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(result.best_r2, max_r2);
        }
    }

    #[test]
    fn test_train_rejects_tiny_dataset() {
        let rows = generate_training_rows(30, 42);
        let err = Forecaster::train(&rows, &small_settings()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData(6)));
    }

    #[test]
    fn test_predict_future_is_hourly_and_non_negative() {
        let rows = generate_training_rows(300, 1);
        let (forecaster, _) = Forecaster::train(&rows, &small_settings()).unwrap();

        let start = crate::synthetic::training_start();
        let predictions = forecaster
            .predict_future("Delhi", 5, &WeatherConditions::default(), start)
            .unwrap();

        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions[4].timestamp - predictions[0].timestamp, Duration::hours(4));
        for prediction in &predictions {
            assert_eq!(prediction.pollutants.len(), 6);
            assert!(prediction.pollutants.iter().all(|(_, v)| v >= 0.0));
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let rows = generate_training_rows(200, 3);
        let (forecaster, _) = Forecaster::train(&rows, &small_settings()).unwrap();
        let short = ndarray::Array1::<f64>::zeros(5);
        assert!(forecaster.predict(short.view()).is_err());
    }
}
