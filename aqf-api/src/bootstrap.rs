//! Startup model initialization
//!
//! Loads the saved artifact, or trains a fresh set from synthetic data when
//! none is usable. Failure leaves the service running on heuristic forecasts.

use aqf_common::db;
use aqf_fc::synthetic::generate_training_rows;
use aqf_fc::Forecaster;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Load or train models and install them in `state`
///
/// Errors are logged; `models_loaded` stays false.
pub async fn init_models(state: &AppState) {
    match load_or_train(state).await {
        Ok(forecaster) => {
            info!(models = ?forecaster.model_kinds(), "Air pollution forecaster initialized");
            state.set_forecaster(forecaster).await;
        }
        Err(e) => error!(error = %e, "Error initializing models"),
    }
}

async fn load_or_train(state: &AppState) -> ApiResult<Forecaster> {
    let model_path = &state.config.model_path;

    if model_path.exists() {
        match Forecaster::load(model_path) {
            Ok(forecaster) => {
                info!(path = %model_path.display(), "Loaded saved models");
                return Ok(forecaster);
            }
            Err(e) => warn!(path = %model_path.display(), error = %e, "Saved models unusable, retraining"),
        }
    } else {
        info!("No existing models found, training new models");
    }

    let forecaster = train_models(state).await?;
    forecaster.save(model_path)?;
    info!(path = %model_path.display(), "Models trained and saved");
    Ok(forecaster)
}

/// Regenerate the training table and fit models on the blocking pool
pub async fn train_models(state: &AppState) -> ApiResult<Forecaster> {
    let settings = state.config.training.clone();

    info!(records = settings.records, seed = settings.seed, "Generating synthetic training data");
    let generated = generate_training_rows(settings.records, settings.seed);
    db::replace_training_rows(&state.db, &generated).await?;
    let rows = db::load_training_rows(&state.db).await?;

    let (forecaster, summary) = tokio::task::spawn_blocking(move || Forecaster::train(&rows, &settings))
        .await
        .map_err(|e| ApiError::Internal(format!("Training task failed: {}", e)))??;

    info!("Model training results:\n{}", summary);
    Ok(forecaster)
}
