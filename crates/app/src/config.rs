use std::time::Duration;

use domain::models::Coordinates;
use domain::services::{GestureThresholds, LifecycleConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub lifecycle: LifecycleSettings,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Required; there is no sensible default server.
    #[serde(default)]
    pub base_url: String,

    /// Per-request timeout of the HTTP client.
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: default_remote_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: default_storage_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_precaution_threshold")]
    pub precaution_threshold: f64,

    #[serde(default = "default_emergency_threshold")]
    pub emergency_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            precaution_threshold: default_precaution_threshold(),
            emergency_threshold: default_emergency_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleSettings {
    /// Upper bound on any collaborator call made during a transition.
    #[serde(default = "default_lifecycle_timeout_ms")]
    pub remote_timeout_ms: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            remote_timeout_ms: default_lifecycle_timeout_ms(),
        }
    }
}

/// Static position used by the command line host, which has no location sensor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationConfig {
    /// When false the host behaves as if location permission was refused.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            nearby_radius_km: default_nearby_radius_km(),
        }
    }
}

// Default value functions
fn default_remote_timeout_ms() -> u64 {
    5000
}
fn default_storage_url() -> String {
    "sqlite://panic_button.db".to_string()
}
fn default_max_connections() -> u32 {
    4
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_precaution_threshold() -> f64 {
    -100.0
}
fn default_emergency_threshold() -> f64 {
    100.0
}
fn default_lifecycle_timeout_ms() -> u64 {
    8000
}
fn default_nearby_radius_km() -> f64 {
    shared::distance::DEFAULT_NEARBY_RADIUS_KM
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Built-in defaults of each field
    /// 2. config/default.toml - base configuration (optional)
    /// 3. config/local.toml - local overrides (optional, not in git)
    /// 4. Environment variables with PB__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PB").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load built-in defaults plus `overrides`, skipping files, environment
    /// and validation.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.remote.base_url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PB__REMOTE__BASE_URL must be set".to_string(),
            ));
        }

        if self.storage.url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PB__STORAGE__URL must be set".to_string(),
            ));
        }

        if crate::logging::LogFormat::parse(&self.logging.format).is_none() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "logging.format must be pretty, compact or json, got {:?}",
                self.logging.format
            )));
        }

        if self.storage.min_connections > self.storage.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !(self.gesture.precaution_threshold < 0.0) || !(self.gesture.emergency_threshold > 0.0) {
            return Err(ConfigValidationError::InvalidValue(
                "precaution_threshold must be negative and emergency_threshold positive".to_string(),
            ));
        }

        if self.lifecycle.remote_timeout_ms == 0 || self.remote.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.location.enabled {
            shared::validation::validate_latitude(self.location.latitude).map_err(|_| {
                ConfigValidationError::InvalidValue("location.latitude out of range".to_string())
            })?;
            shared::validation::validate_longitude(self.location.longitude).map_err(|_| {
                ConfigValidationError::InvalidValue("location.longitude out of range".to_string())
            })?;
        }

        if !(self.history.nearby_radius_km > 0.0) {
            return Err(ConfigValidationError::InvalidValue(
                "nearby_radius_km must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn gesture_thresholds(&self) -> GestureThresholds {
        GestureThresholds {
            precaution: self.gesture.precaution_threshold,
            emergency: self.gesture.emergency_threshold,
        }
    }

    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            remote_timeout: Duration::from_millis(self.lifecycle.remote_timeout_ms),
        }
    }

    pub fn database_config(&self) -> persistence::DatabaseConfig {
        persistence::DatabaseConfig {
            url: self.storage.url.clone(),
            max_connections: self.storage.max_connections,
            min_connections: self.storage.min_connections,
            connect_timeout_secs: self.storage.connect_timeout_secs,
            idle_timeout_secs: self.storage.idle_timeout_secs,
        }
    }

    /// Configured static position, `None` when location is disabled.
    pub fn fixed_position(&self) -> Option<Coordinates> {
        self.location
            .enabled
            .then(|| Coordinates::new(self.location.latitude, self.location.longitude))
    }
}
