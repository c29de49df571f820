//! Configuration
//!
//! Configuration loading for the Conductor, supporting a TOML file at
//! `~/.config/weather-assistant/conductor.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:4000"
//! connect_timeout_ms = 5000
//!
//! [timing]
//! placeholder_delay_ms = 800
//! min_placeholder_display_ms = 1000
//! voice_submit_delay_ms = 1000
//!
//! [location]
//! latitude = 37.5665
//! longitude = 126.978
//!
//! [profile]
//! user_name = "나연"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::gate::MIN_PLACEHOLDER_DISPLAY;
use crate::home::DEFAULT_USER_NAME;
use crate::indicator::PLACEHOLDER_DELAY;
use crate::location::Coordinates;

/// Delay between a voice recognition result and its submission
pub const VOICE_SUBMIT_DELAY: Duration = Duration::from_millis(1000);

/// Backend base URL override
pub const ENV_BACKEND_URL: &str = "WEATHER_ASSISTANT_BACKEND_URL";
/// Latitude override
pub const ENV_LATITUDE: &str = "WEATHER_ASSISTANT_LATITUDE";
/// Longitude override
pub const ENV_LONGITUDE: &str = "WEATHER_ASSISTANT_LONGITUDE";
/// Greeting name override
pub const ENV_USER: &str = "WEATHER_ASSISTANT_USER";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where configuration values came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Server base URL
    pub base_url: Option<String>,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// `[timing]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    /// Delay before the thinking placeholder appears
    pub placeholder_delay_ms: Option<u64>,
    /// Minimum time the placeholder stays up once shown
    pub min_placeholder_display_ms: Option<u64>,
    /// Delay between voice recognition and submission
    pub voice_submit_delay_ms: Option<u64>,
}

/// `[location]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationToml {
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

/// `[profile]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileToml {
    /// Name used in the greeting
    pub user_name: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorToml {
    /// Backend section
    pub backend: BackendToml,
    /// Timing section
    pub timing: TimingToml,
    /// Location section
    pub location: LocationToml,
    /// Profile section
    pub profile: ProfileToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Backend connection
    pub backend: BackendConfig,
    /// Delay before the thinking placeholder appears
    pub placeholder_delay: Duration,
    /// Minimum time the placeholder stays up once shown
    pub min_placeholder_display: Duration,
    /// Delay between voice recognition and submission
    pub voice_submit_delay: Duration,
    /// Configured position (absent means location access is unavailable)
    pub coordinates: Option<Coordinates>,
    /// Name used in the greeting
    pub user_name: String,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            placeholder_delay: PLACEHOLDER_DELAY,
            min_placeholder_display: MIN_PLACEHOLDER_DISPLAY,
            voice_submit_delay: VOICE_SUBMIT_DELAY,
            coordinates: None,
            user_name: DEFAULT_USER_NAME.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ConductorConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default file location and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the resulting values are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        load_config_from_path(default_config_path().as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configured position
    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Set both placeholder timings
    #[must_use]
    pub fn with_timing(mut self, placeholder_delay: Duration, min_display: Duration) -> Self {
        self.placeholder_delay = placeholder_delay;
        self.min_placeholder_display = min_display;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.placeholder_delay.is_zero() {
            return Err(ConfigError::ValidationError(
                "placeholder_delay_ms must be positive".to_string(),
            ));
        }
        if self.min_placeholder_display.is_zero() {
            return Err(ConfigError::ValidationError(
                "min_placeholder_display_ms must be positive".to_string(),
            ));
        }
        if self.voice_submit_delay.is_zero() {
            return Err(ConfigError::ValidationError(
                "voice_submit_delay_ms must be positive".to_string(),
            ));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend base_url must not be empty".to_string(),
            ));
        }
        if let Some(coords) = self.coordinates {
            if !coords.is_valid() {
                return Err(ConfigError::ValidationError(format!(
                    "coordinates out of range: {}, {}",
                    coords.latitude, coords.longitude
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/weather-assistant/conductor.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("weather-assistant").join("conductor.toml"))
}

/// Load configuration from a file path and an environment lookup
///
/// A missing file is not an error (defaults are used).
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the merged
/// values fail validation.
pub fn load_config_from_path<F>(path: Option<&Path>, env: F) -> Result<ConductorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ConductorConfig::default();
    let mut latitude = None;
    let mut longitude = None;

    if let Some(config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;

            let toml_config: ConductorToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            latitude = toml_config.location.latitude;
            longitude = toml_config.location.longitude;
            config.config_file_path = Some(config_path.to_path_buf());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    if let Some(url) = env(ENV_BACKEND_URL) {
        config.backend.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(name) = env(ENV_USER) {
        config.user_name = name;
        config.source = ConfigSource::Env;
    }
    if let Some(value) = env(ENV_LATITUDE) {
        latitude = Some(parse_degrees(ENV_LATITUDE, &value)?);
        config.source = ConfigSource::Env;
    }
    if let Some(value) = env(ENV_LONGITUDE) {
        longitude = Some(parse_degrees(ENV_LONGITUDE, &value)?);
        config.source = ConfigSource::Env;
    }

    config.coordinates = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        (None, None) => None,
        _ => {
            return Err(ConfigError::ValidationError(
                "latitude and longitude must be set together".to_string(),
            ))
        }
    };

    config.validate()?;
    Ok(config)
}

fn parse_degrees(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::ValidationError(format!("{key}={value:?}: {e}")))
}

fn apply_toml_config(config: &mut ConductorConfig, toml: &ConductorToml) {
    if let Some(ref url) = toml.backend.base_url {
        config.backend.base_url = url.clone();
    }
    if let Some(ms) = toml.backend.connect_timeout_ms {
        config.backend.connect_timeout_ms = ms;
    }

    if let Some(ms) = toml.timing.placeholder_delay_ms {
        config.placeholder_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.timing.min_placeholder_display_ms {
        config.min_placeholder_display = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.timing.voice_submit_delay_ms {
        config.voice_submit_delay = Duration::from_millis(ms);
    }

    if let Some(ref name) = toml.profile.user_name {
        config.user_name = name.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ConductorConfig::default();

        assert_eq!(config.backend.base_url, "http://localhost:4000");
        assert_eq!(config.placeholder_delay, Duration::from_millis(800));
        assert_eq!(config.min_placeholder_display, Duration::from_millis(1000));
        assert_eq!(config.voice_submit_delay, Duration::from_millis(1000));
        assert_eq!(config.coordinates, None);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("weather-assistant"));
            assert!(p.to_string_lossy().ends_with("conductor.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[backend]
base_url = "http://weather.local:8080"
connect_timeout_ms = 2500

[timing]
placeholder_delay_ms = 500
min_placeholder_display_ms = 1500

[location]
latitude = 37.5665
longitude = 126.978

[profile]
user_name = "민수"
"#,
        );

        let config = load_config_from_path(Some(file.path()), no_env).unwrap();
        assert_eq!(config.backend.base_url, "http://weather.local:8080");
        assert_eq!(config.backend.connect_timeout_ms, 2500);
        assert_eq!(config.placeholder_delay, Duration::from_millis(500));
        assert_eq!(config.min_placeholder_display, Duration::from_millis(1500));
        assert_eq!(config.voice_submit_delay, VOICE_SUBMIT_DELAY);
        assert_eq!(config.coordinates, Some(Coordinates::new(37.5665, 126.978)));
        assert_eq!(config.user_name, "민수");
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_missing_file_graceful() {
        let config =
            load_config_from_path(Some(Path::new("/nonexistent/conductor.toml")), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[backend\nbase_url = ");
        let result = load_config_from_path(Some(file.path()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml(
            r#"
[backend]
base_url = "http://from-file:4000"

[location]
latitude = 10.0
longitude = 20.0
"#,
        );
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://from-env:4000"),
            (ENV_LATITUDE, "35.1"),
            (ENV_USER, "지우"),
        ]
        .into_iter()
        .collect();

        let config = load_config_from_path(Some(file.path()), |k| {
            env.get(k).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.backend.base_url, "http://from-env:4000");
        assert_eq!(config.coordinates, Some(Coordinates::new(35.1, 20.0)));
        assert_eq!(config.user_name, "지우");
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_lone_latitude_rejected() {
        let result = load_config_from_path(None, |k| {
            (k == ENV_LATITUDE).then(|| "37.5".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_bad_env_number_rejected() {
        let result = load_config_from_path(None, |k| {
            (k == ENV_LONGITUDE || k == ENV_LATITUDE).then(|| "north".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_timing_rejected() {
        let file = write_toml("[timing]\nplaceholder_delay_ms = 0\n");
        let result = load_config_from_path(Some(file.path()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let file = write_toml("[location]\nlatitude = 95.0\nlongitude = 0.0\n");
        let result = load_config_from_path(Some(file.path()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ValidationError("bad".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad");
    }
}
