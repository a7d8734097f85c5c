//! Configuration loading and resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority; clap also maps its `env` names here)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed TOML file never stops startup: it is logged and
//! treated as empty.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "AQF_CONFIG";
pub const OPENWEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const AIRVISUAL_KEY_ENV: &str = "AIRVISUAL_API_KEY";
pub const WAQI_TOKEN_ENV: &str = "WAQI_TOKEN";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "pollution_data.db";
pub const DEFAULT_MODEL_PATH: &str = "pollution_models.json";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Frontend origins allowed by CORS when none are configured
pub fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// `[providers]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderKeys {
    pub openweather_api_key: Option<String>,
    pub airvisual_api_key: Option<String>,
    pub waqi_token: Option<String>,
}

/// `[training]` section: model hyperparameters and synthetic data volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Synthetic rows generated when no model artifact exists
    pub records: usize,
    pub forest_trees: usize,
    pub boosting_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            records: 10_000,
            forest_trees: 30,
            boosting_trees: 60,
            max_depth: 8,
            min_samples_leaf: 5,
            learning_rate: 0.1,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "aqf_api=debug"
    pub level: Option<String>,
}

/// On-disk TOML configuration; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub provider_timeout_secs: Option<u64>,
    pub cors_origins: Option<Vec<String>>,
    #[serde(default)]
    pub providers: ProviderKeys,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default config file location: `$AQF_CONFIG`, else `<config dir>/aqf/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("aqf").join("config.toml"))
}

/// Read and parse a TOML config file (strict)
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load TOML config with graceful degradation
///
/// Missing file: info + defaults. Unreadable or invalid file: warning + defaults.
pub fn load_toml_config(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        info!("No config file location available, using defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        info!("Config file not found at {}, using defaults", path.display());
        return TomlConfig::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            info!("Loaded config file: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; continuing with defaults", e);
            TomlConfig::default()
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one provider credential: environment first, then TOML
///
/// Returns `None` when neither source holds a valid key; the provider is then
/// skipped at request time.
pub fn resolve_api_key(name: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} key found in environment and TOML config. Using environment (highest priority).",
            name
        );
    }

    if let Some(key) = env_key {
        info!("{} key loaded from environment variable {}", name, env_var);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} key loaded from TOML config", name);
        return Some(key.trim().to_string());
    }

    info!("{} key not configured; provider disabled", name);
    None
}

/// Values supplied on the command line (or via clap's env mapping)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub model_path: PathBuf,
    pub provider_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub providers: ProviderKeys,
    pub training: TrainingSettings,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            cors_origins: default_cors_origins(),
            providers: ProviderKeys::default(),
            training: TrainingSettings::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Merge CLI overrides, environment and TOML over compiled defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let defaults = Self::default();

        let providers = ProviderKeys {
            openweather_api_key: resolve_api_key(
                "OpenWeatherMap",
                OPENWEATHER_KEY_ENV,
                toml.providers.openweather_api_key.as_deref(),
            ),
            airvisual_api_key: resolve_api_key(
                "AirVisual",
                AIRVISUAL_KEY_ENV,
                toml.providers.airvisual_api_key.as_deref(),
            ),
            waqi_token: resolve_api_key("WAQI", WAQI_TOKEN_ENV, toml.providers.waqi_token.as_deref()),
        };

        let provider_timeout = toml
            .provider_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.provider_timeout);

        Self {
            host: cli.host.or(toml.host).unwrap_or(defaults.host),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            database_path: cli
                .database_path
                .or(toml.database_path)
                .unwrap_or(defaults.database_path),
            model_path: cli.model_path.or(toml.model_path).unwrap_or(defaults.model_path),
            provider_timeout,
            cors_origins: toml
                .cors_origins
                .filter(|o| !o.is_empty())
                .unwrap_or(defaults.cors_origins),
            providers,
            training: toml.training,
            log_level: toml.logging.level.unwrap_or(defaults.log_level),
        }
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
