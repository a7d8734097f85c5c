//! aqf-fc - offline forecaster CLI
//!
//! `train` generates synthetic data, stores it in SQLite, fits the models and
//! writes the artifact. `report` and `predict` use the saved artifact,
//! training first when none exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aqf_common::config::{
    config_file_path, load_toml_config, TrainingSettings, DEFAULT_DATABASE_PATH,
    DEFAULT_MODEL_PATH,
};
use aqf_common::{cities, db, AqiCalculator, AqiStandard, Pollutant};
use aqf_fc::report::ForecastReport;
use aqf_fc::synthetic::generate_training_rows;
use aqf_fc::{Forecaster, WeatherConditions};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Records generated by `train` unless overridden
const CLI_DEFAULT_RECORDS: usize = 15_000;

#[derive(Parser, Debug)]
#[command(name = "aqf-fc")]
#[command(about = "Air pollution forecaster: train models and print forecasts")]
#[command(version)]
struct Args {
    /// SQLite database holding the synthetic training rows
    #[arg(long, env = "AQF_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Model artifact path
    #[arg(long, env = "AQF_MODEL_PATH")]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate training data, fit models and save the artifact
    Train {
        /// Number of synthetic hourly records
        #[arg(long, default_value_t = CLI_DEFAULT_RECORDS)]
        records: usize,
    },
    /// Print a forecast report for a city
    Report {
        #[arg(long, default_value = "Delhi")]
        city: String,

        #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..=168))]
        hours: u32,
    },
    /// Predict the next hour for a city under given weather
    Predict {
        #[arg(long, default_value = "Mumbai")]
        city: String,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long)]
        humidity: Option<f64>,

        #[arg(long)]
        wind_speed: Option<f64>,

        #[arg(long)]
        pressure: Option<f64>,

        /// Clear, Cloudy, Rainy, Foggy or Stormy
        #[arg(long)]
        weather: Option<String>,

        /// Winter, Spring, Summer or Monsoon
        #[arg(long)]
        season: Option<String>,
    },
}

struct Paths {
    database: PathBuf,
    model: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqf_fc=info,aqf_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let toml = load_toml_config(config_file_path().as_deref());

    let paths = Paths {
        database: args
            .database
            .or(toml.database_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
        model: args
            .model
            .or(toml.model_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
    };
    let settings = toml.training;

    match args.command {
        Command::Train { records } => {
            let forecaster = train_and_save(&paths, &settings, records).await?;
            info!(models = ?forecaster.model_kinds(), "Training complete");
        }
        Command::Report { city, hours } => {
            if cities::find(&city).is_none() {
                warn!(%city, "Unsupported city, predictions use default encodings");
            }
            let forecaster = load_or_train(&paths, &settings).await?;
            let now = Local::now().naive_local();
            let conditions = WeatherConditions::default();
            let predictions = forecaster
                .predict_future(&city, hours, &conditions, now)
                .context("Prediction failed")?;
            let report = ForecastReport::build(&city, now, &predictions)?;
            println!("{}", report);
        }
        Command::Predict {
            city,
            temperature,
            humidity,
            wind_speed,
            pressure,
            weather,
            season,
        } => {
            let defaults = WeatherConditions::default();
            let conditions = WeatherConditions {
                temperature: temperature.unwrap_or(defaults.temperature),
                humidity: humidity.unwrap_or(defaults.humidity),
                wind_speed: wind_speed.unwrap_or(defaults.wind_speed),
                pressure: pressure.unwrap_or(defaults.pressure),
                weather_condition: weather.unwrap_or(defaults.weather_condition),
                season: season.unwrap_or(defaults.season),
            };

            let forecaster = load_or_train(&paths, &settings).await?;
            let now = Local::now().naive_local();
            let predictions = forecaster.predict_future(&city, 1, &conditions, now)?;
            let Some(next) = predictions.first() else {
                anyhow::bail!("No prediction produced");
            };

            let aqi = AqiCalculator::new(AqiStandard::India)
                .calculate(&next.pollutants)
                .context("AQI calculation failed")?;
            println!("Predicted AQI for {}: {:.0} ({})", city, aqi.aqi, aqi.category);
            for pollutant in Pollutant::ALL {
                if let Some(value) = next.pollutants.get(pollutant) {
                    println!("  {}: {:.1} μg/m³", pollutant, value);
                }
            }
        }
    }

    Ok(())
}

async fn load_or_train(paths: &Paths, settings: &TrainingSettings) -> Result<Forecaster> {
    if paths.model.exists() {
        match Forecaster::load(&paths.model) {
            Ok(forecaster) => {
                info!(path = %paths.model.display(), "Loaded models");
                return Ok(forecaster);
            }
            Err(e) => warn!(error = %e, "Saved models unusable, retraining"),
        }
    } else {
        info!("No existing models found, training new models");
    }
    train_and_save(paths, settings, CLI_DEFAULT_RECORDS).await
}

async fn train_and_save(
    paths: &Paths,
    settings: &TrainingSettings,
    records: usize,
) -> Result<Forecaster> {
    info!(records, seed = settings.seed, "Generating synthetic training data");
    let generated = generate_training_rows(records, settings.seed);

    let pool = db::init_database(&paths.database)
        .await
        .with_context(|| format!("Failed to open database {}", paths.database.display()))?;
    db::replace_training_rows(&pool, &generated).await?;
    let rows = db::load_training_rows(&pool).await?;
    pool.close().await;

    let settings = settings.clone();
    let (forecaster, summary) =
        tokio::task::spawn_blocking(move || Forecaster::train(&rows, &settings))
            .await
            .context("Training task panicked")??;

    println!("\nMODEL TRAINING RESULTS:\n{}", summary);
    save(&forecaster, &paths.model)?;
    Ok(forecaster)
}

fn save(forecaster: &Forecaster, path: &Path) -> Result<()> {
    forecaster
        .save(path)
        .with_context(|| format!("Failed to save models to {}", path.display()))
}
