//! Forecast and historical series endpoints

use aqf_fc::WeatherConditions;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{info, warn};

use super::params::lenient_int;
use crate::error::{ApiError, ApiResult};
use crate::synthetic::{self, ForecastPoint, HistoricalPoint, TIMESTAMP_FORMAT};
use crate::AppState;

pub const DEFAULT_FORECAST_HOURS: i64 = 24;
pub const FORECAST_HOURS: RangeInclusive<i64> = 1..=168;
pub const DEFAULT_HISTORY_DAYS: i64 = 7;
pub const HISTORY_DAYS: RangeInclusive<i64> = 1..=365;
pub const DEFAULT_HISTORY_CITY: &str = "Mumbai";

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub hours: Option<i64>,
    #[serde(default)]
    pub use_model: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    Model,
    Heuristic,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub success: bool,
    pub city: String,
    pub predictions: Vec<ForecastPoint>,
    pub hours: u32,
    pub generated_at: String,
    pub method: ForecastMethod,
}

/// Validate an optional integer parameter against its allowed range
fn bounded(value: Option<i64>, default: i64, range: &RangeInclusive<i64>, name: &str) -> ApiResult<u32> {
    let value = value.unwrap_or(default);
    if !range.contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "{} must be between {} and {}",
            name,
            range.start(),
            range.end()
        )));
    }
    // Ranges are small and positive
    Ok(value as u32)
}

/// POST /api/forecast
///
/// Trained models are used only when requested and loaded; otherwise the
/// heuristic generator answers.
pub async fn forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> ApiResult<Json<ForecastResponse>> {
    let Json(request) = payload?;
    let city = request
        .city
        .ok_or_else(|| ApiError::BadRequest("City parameter is required".to_string()))?;
    let hours = bounded(request.hours, DEFAULT_FORECAST_HOURS, &FORECAST_HOURS, "Hours")?;

    info!(city = %city, hours, use_model = request.use_model, "Generating forecast");
    let now = Local::now().naive_local();

    let model_points = if request.use_model && state.models_loaded() {
        let guard = state.forecaster.read().await;
        match guard.as_ref() {
            Some(forecaster) => {
                let conditions = WeatherConditions::seasonal(now.month(), &mut rand::thread_rng());
                let predictions = forecaster.predict_future(&city, hours, &conditions, now)?;
                Some(synthetic::model_forecast(&predictions, hours))
            }
            None => None,
        }
    } else {
        None
    };

    if request.use_model && model_points.is_none() {
        warn!(city = %city, "Models not loaded, falling back to heuristic forecast");
    }

    let (predictions, method) = match model_points {
        Some(points) => (points, ForecastMethod::Model),
        None => (
            synthetic::mock_forecast(&city, hours, &mut rand::thread_rng(), now),
            ForecastMethod::Heuristic,
        ),
    };

    Ok(Json(ForecastResponse {
        success: true,
        city,
        predictions,
        hours,
        generated_at: now.format(TIMESTAMP_FORMAT).to_string(),
        method,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoricalRequest {
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoricalResponse {
    pub success: bool,
    pub city: String,
    pub data: Vec<HistoricalPoint>,
    pub days: u32,
}

/// POST /api/historical
pub async fn historical(
    payload: Result<Json<HistoricalRequest>, JsonRejection>,
) -> ApiResult<Json<HistoricalResponse>> {
    let Json(request) = payload?;
    let city = request.city.unwrap_or_else(|| DEFAULT_HISTORY_CITY.to_string());
    let days = bounded(request.days, DEFAULT_HISTORY_DAYS, &HISTORY_DAYS, "Days")?;

    let now = Local::now().naive_local();
    let data = synthetic::historical(&city, days, &mut rand::thread_rng(), now);

    Ok(Json(HistoricalResponse {
        success: true,
        city,
        data,
        days,
    }))
}

/// Build forecast routes
pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/api/forecast", post(forecast))
        .route("/api/historical", post(historical))
}
