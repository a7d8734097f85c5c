//! aqf-api library - Air quality HTTP service
//!
//! Serves current conditions (live providers with a synthetic fallback),
//! forecasts (heuristic or trained models), historical series, the city list
//! and health advice.

use aqf_common::config::ServiceConfig;
use aqf_fc::Forecaster;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod providers;
pub mod synthetic;

pub use error::{ApiError, ApiResult};
use providers::ProviderFetcher;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub fetcher: Arc<ProviderFetcher>,
    /// Holds synthetic training rows
    pub db: SqlitePool,
    /// Trained models, `None` until initialization succeeds
    pub forecaster: Arc<RwLock<Option<Forecaster>>>,
    pub models_loaded: Arc<AtomicBool>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, fetcher: ProviderFetcher, db: SqlitePool) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            db,
            forecaster: Arc::new(RwLock::new(None)),
            models_loaded: Arc::new(AtomicBool::new(false)),
            startup_time: Utc::now(),
        }
    }

    pub fn models_loaded(&self) -> bool {
        self.models_loaded.load(Ordering::Acquire)
    }

    /// Install a forecaster and mark models as loaded
    pub async fn set_forecaster(&self, forecaster: Forecaster) {
        *self.forecaster.write().await = Some(forecaster);
        self.models_loaded.store(true, Ordering::Release);
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(api::health_routes())
        .merge(api::conditions_routes())
        .merge(api::forecast_routes())
        .merge(api::recommendation_routes())
        .fallback(api::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
