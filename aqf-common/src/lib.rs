//! # AQF Common Library
//!
//! Shared code for the air-quality forecasting service and trainer:
//! - Pollutant types and AQI breakpoint calculation
//! - Multi-provider reading reconciliation
//! - Supported city catalog
//! - Health recommendations
//! - Configuration loading
//! - SQLite storage for synthetic training rows

pub mod aqi;
pub mod cities;
pub mod config;
pub mod db;
pub mod error;
pub mod pollutants;
pub mod recommendations;
pub mod reconcile;

pub use aqi::{AqiCalculator, AqiError, AqiResult, AqiStandard};
pub use error::{Error, Result};
pub use pollutants::{AqiCategory, Pollutant, PollutantReading};
