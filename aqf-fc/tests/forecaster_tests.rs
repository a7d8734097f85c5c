//! Integration tests for training, artifact persistence and prediction

use aqf_common::config::TrainingSettings;
use aqf_common::db;
use aqf_fc::synthetic::{generate_training_rows, training_start};
use aqf_fc::{ForecastError, Forecaster, WeatherConditions};
use tempfile::TempDir;

fn quick_settings() -> TrainingSettings {
    TrainingSettings {
        records: 300,
        forest_trees: 3,
        boosting_trees: 5,
        max_depth: 4,
        min_samples_leaf: 5,
        ..TrainingSettings::default()
    }
}

#[test]
fn test_save_load_round_trip_preserves_predictions() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("models").join("pollution_models.json");

    let rows = generate_training_rows(300, 42);
    let (forecaster, _) = Forecaster::train(&rows, &quick_settings()).unwrap();
    forecaster.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Forecaster::load(&path).unwrap();
    assert_eq!(loaded.model_kinds(), forecaster.model_kinds());
    assert_eq!(loaded.feature_columns(), forecaster.feature_columns());

    let conditions = WeatherConditions::default();
    let before = forecaster
        .predict_future("Mumbai", 6, &conditions, training_start())
        .unwrap();
    let after = loaded
        .predict_future("Mumbai", 6, &conditions, training_start())
        .unwrap();

    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.timestamp, b.timestamp);
        for ((pa, va), (pb, vb)) in a.pollutants.iter().zip(b.pollutants.iter()) {
            assert_eq!(pa, pb);
            assert!((va - vb).abs() < 1e-6, "{}: {} vs {}", pa, va, vb);
        }
    }
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = Forecaster::load(&temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ForecastError::Io(_)));
}

#[test]
fn test_load_rejects_garbage() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.json");
    std::fs::write(&path, "{\"not\": \"a model\"}").unwrap();
    assert!(matches!(
        Forecaster::load(&path).unwrap_err(),
        ForecastError::Serialization(_)
    ));
}

#[tokio::test]
async fn test_train_from_database_rows() {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::init_database(&temp_dir.path().join("pollution_data.db"))
        .await
        .unwrap();

    let generated = generate_training_rows(250, 42);
    db::replace_training_rows(&pool, &generated).await.unwrap();
    let stored = db::load_training_rows(&pool).await.unwrap();
    assert_eq!(stored.len(), 250);

    let (forecaster, summary) = Forecaster::train(&stored, &quick_settings()).unwrap();
    assert_eq!(summary.usable_rows, 226);
    assert_eq!(forecaster.model_kinds().len(), 6);
}
