pub mod mode;

pub use mode::GeocodingMode;

use crate::error::config::ConfigError;
use crate::{MAPQUEST_GEOCODE_URL, MAPQUEST_REVERSE_GEOCODE_URL};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

pub const CONFIG_DIR_ENV: &str = "GEOCODER_CONFIG_DIR";
pub const GEOCODE_URL_ENV: &str = "GEOCODER_GEOCODE_URL";
pub const REVERSE_GEOCODE_URL_ENV: &str = "GEOCODER_REVERSE_GEOCODE_URL";
pub const LOG_LEVEL_ENV: &str = "GEOCODER_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "GEOCODER_LOG_DIR";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingSettings {
    /// Mode used when the `ready` handshake names none (or an unknown one).
    #[serde(default)]
    pub default_type: GeocodingMode,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_reverse_geocode_url")]
    pub reverse_geocode_url: String,
    /// `None` leaves the HTTP client without an explicit timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            default_type: GeocodingMode::default(),
            geocode_url: default_geocode_url(),
            reverse_geocode_url: default_reverse_geocode_url(),
            request_timeout_secs: None,
        }
    }
}

impl GeocodingSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level name understood by `log::LevelFilter` (`"info"`, `"debug"`, ...).
    #[serde(default)]
    pub level: Option<String>,
    /// Directory for `geocoder.log`. Logs go to stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl LoggingSettings {
    /// Configured level, if any. Call after `validate`, which rejects names
    /// that do not parse.
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.level
            .as_deref()
            .and_then(|level| LevelFilter::from_str(level).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub geocoding: GeocodingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            geocoding: GeocodingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_geocode_url() -> String {
    MAPQUEST_GEOCODE_URL.to_string()
}
fn default_reverse_geocode_url() -> String {
    MAPQUEST_REVERSE_GEOCODE_URL.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AdapterConfig {
    /// Directory holding `config.json`: `$GEOCODER_CONFIG_DIR`, else the
    /// current directory.
    pub fn config_dir() -> PathBuf {
        env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loads {config_dir}/config.json, applies environment overrides and
    /// validates the result.
    ///
    /// A missing file yields defaults (still subject to overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if the final configuration is invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
                    location: ErrorLocation::from(Location::caller()),
                    path: config_path.clone(),
                    source: e,
                })?;

            let config: AdapterConfig =
                serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                    location: ErrorLocation::from(Location::caller()),
                    path: config_path.clone(),
                    reason: e.to_string(),
                })?;

            info!("Config loaded from {}", config_path.display());
            config
        } else {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Environment variables win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(GEOCODE_URL_ENV) {
            info!("Geocode URL overridden by {GEOCODE_URL_ENV}");
            self.geocoding.geocode_url = url;
        }
        if let Ok(url) = env::var(REVERSE_GEOCODE_URL_ENV) {
            info!("Reverse geocode URL overridden by {REVERSE_GEOCODE_URL_ENV}");
            self.geocoding.reverse_geocode_url = url;
        }
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            self.logging.level = Some(level);
        }
        if let Some(dir) = env::var_os(LOG_DIR_ENV) {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        validate_endpoint("geocode_url", &self.geocoding.geocode_url)?;
        validate_endpoint("reverse_geocode_url", &self.geocoding.reverse_geocode_url)?;

        if self.geocoding.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Some(ref level) = self.logging.level
            && LevelFilter::from_str(level).is_err()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid log level: {level}"),
            });
        }

        Ok(())
    }
}

#[track_caller]
fn validate_endpoint(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: format!("Invalid {field} '{value}': {e}"),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid {field} scheme: {}", url.scheme()),
        });
    }

    Ok(())
}

/// Loads a `.env` file from the current directory, falling back to the
/// executable's directory. Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_path = env::current_exe().ok()?;
    let env_path = exe_path.parent()?.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}
