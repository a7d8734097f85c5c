//! HTTP API handlers for aqf-api

pub mod conditions;
pub mod forecast;
pub mod health;
pub mod params;
pub mod recommendations;

pub use conditions::conditions_routes;
pub use forecast::forecast_routes;
pub use health::health_routes;
pub use recommendations::recommendation_routes;

use crate::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
