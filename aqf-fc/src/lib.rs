//! aqf-fc - Air pollution forecaster
//!
//! Generates synthetic hourly training data, fits per-pollutant regression
//! models (random forest, gradient boosting, linear regression), keeps the
//! best one by R², and predicts future pollutant levels.
//!
//! The `aqf-fc` binary is the offline training CLI; `aqf-api` loads the saved
//! artifact at startup.

pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod report;
pub mod synthetic;

pub use crate::error::{ForecastError, ForecastResult};
pub use crate::forecaster::{Forecaster, HourlyPrediction, TrainingSummary};
pub use crate::synthetic::WeatherConditions;
