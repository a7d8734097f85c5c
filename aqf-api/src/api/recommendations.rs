//! Health advice endpoint

use aqf_common::recommendations::{self, HealthRecommendation};
use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::params::lenient_float;
use crate::error::ApiResult;
use crate::AppState;

pub const DEFAULT_AQI: f64 = 50.0;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default, deserialize_with = "lenient_float")]
    pub aqi: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub aqi: i64,
    pub recommendations: HealthRecommendation,
}

/// POST /api/health-recommendations
///
/// Fractional AQI values are truncated. Numeric strings are accepted.
pub async fn health_recommendations(
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendationResponse>> {
    let Json(request) = payload?;
    let aqi = request.aqi.unwrap_or(DEFAULT_AQI).trunc() as i64;

    Ok(Json(RecommendationResponse {
        success: true,
        aqi,
        recommendations: recommendations::for_aqi(aqi as f64),
    }))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new().route("/api/health-recommendations", post(health_recommendations))
}
