//! Current conditions, provider status and supported cities

use aqf_common::cities::CITIES;
use aqf_common::reconcile::{CombinedReading, Source};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::providers::{SourceState, SourceStatus};
use crate::synthetic::{self, SyntheticConditions};
use crate::AppState;

/// City probed by the data-sources check
pub const PROBE_CITY: &str = "Mumbai";

#[derive(Debug, Deserialize)]
pub struct CurrentRequest {
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Real,
    Synthetic,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Conditions {
    Real(CombinedReading),
    Synthetic(SyntheticConditions),
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub success: bool,
    pub city: String,
    pub conditions: Conditions,
    pub data_type: DataType,
}

/// POST /api/current
///
/// Live provider data when any provider answers, synthetic otherwise.
pub async fn current_conditions(
    State(state): State<AppState>,
    payload: Result<Json<CurrentRequest>, JsonRejection>,
) -> ApiResult<Json<CurrentResponse>> {
    let Json(request) = payload?;
    let city = request
        .city
        .ok_or_else(|| ApiError::BadRequest("City parameter is required".to_string()))?;

    info!(city = %city, "Fetching current conditions");

    let (conditions, data_type) = match state.fetcher.fetch_combined(&city).await {
        Some(reading) => {
            info!(city = %city, sources = ?reading.sources_used, "Live data fetched");
            (Conditions::Real(reading), DataType::Real)
        }
        None => {
            info!(city = %city, "No live data available, using synthetic conditions");
            let now = Local::now().naive_local();
            let conditions = synthetic::current_conditions(&city, &mut rand::thread_rng(), now);
            (Conditions::Synthetic(conditions), DataType::Synthetic)
        }
    };

    Ok(Json(CurrentResponse {
        success: true,
        city,
        conditions,
        data_type,
    }))
}

#[derive(Debug, Serialize)]
pub struct DataSourcesResponse {
    pub success: bool,
    pub sources: BTreeMap<Source, SourceStatus>,
    pub total_active: usize,
}

/// GET /api/data-sources
pub async fn data_sources(State(state): State<AppState>) -> Json<DataSourcesResponse> {
    let sources = state.fetcher.source_status(PROBE_CITY).await;
    let total_active = sources
        .values()
        .filter(|s| s.status == SourceState::Active)
        .count();

    Json(DataSourcesResponse {
        success: true,
        sources,
        total_active,
    })
}

#[derive(Debug, Serialize)]
pub struct CityEntry {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    /// `[latitude, longitude]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub success: bool,
    pub cities: Vec<CityEntry>,
}

/// GET /api/cities
pub async fn list_cities() -> Json<CitiesResponse> {
    let cities = CITIES
        .iter()
        .map(|c| CityEntry {
            value: c.name,
            label: c.name,
            icon: c.icon,
            coordinates: [c.latitude, c.longitude],
        })
        .collect();

    Json(CitiesResponse {
        success: true,
        cities,
    })
}

/// Build current-conditions routes
pub fn conditions_routes() -> Router<AppState> {
    Router::new()
        .route("/api/current", post(current_conditions))
        .route("/api/data-sources", get(data_sources))
        .route("/api/cities", get(list_cities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqf_common::cities;

    #[test]
    fn test_city_entries_match_catalog() {
        let entries: Vec<&str> = CITIES.iter().map(|c| c.name).collect();
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|name| cities::find(name).is_some()));
    }

    #[test]
    fn test_data_type_serialization() {
        assert_eq!(serde_json::to_value(DataType::Real).unwrap(), "real");
        assert_eq!(serde_json::to_value(DataType::Synthetic).unwrap(), "synthetic");
    }
}
