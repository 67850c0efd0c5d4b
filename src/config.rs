//! Configuration file handling for stand-capture.
//!
//! Loads configuration from `~/.config/stand-capture/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{sample_period, LoopSettings, DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLES_PER_SECOND};
use crate::detect::{
    CooldownPolicy, DEFAULT_BASE_URL, DEFAULT_SERVER_ERROR_COOLDOWN, DEFAULT_TIMEOUT_COOLDOWN,
    DEFAULT_UPLOAD_TIMEOUT, DETECT_URL_ENV,
};
use crate::overlay::DisplaySize;

/// Configuration file structure for stand-capture.
/// Loaded from ~/.config/stand-capture/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DetectorConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_timeout_cooldown_ms")]
    pub timeout_cooldown_ms: u64,
    #[serde(default = "default_server_error_cooldown_ms")]
    pub server_error_cooldown_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_timeout_ms(),
            timeout_cooldown_ms: default_timeout_cooldown_ms(),
            server_error_cooldown_ms: default_server_error_cooldown_ms(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_samples_per_second")]
    pub samples_per_second: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            samples_per_second: default_samples_per_second(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct CameraConfig {
    #[serde(default)]
    pub device: usize,
    #[serde(default)]
    pub mirror_overlay: bool,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT.as_millis() as u64
}

fn default_timeout_cooldown_ms() -> u64 {
    DEFAULT_TIMEOUT_COOLDOWN.as_millis() as u64
}

fn default_server_error_cooldown_ms() -> u64 {
    DEFAULT_SERVER_ERROR_COOLDOWN.as_millis() as u64
}

fn default_samples_per_second() -> u32 {
    DEFAULT_SAMPLES_PER_SECOND
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or holds
    /// out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.samples_per_second == 0 {
            return Err(ConfigError::Invalid(
                "capture.samples_per_second must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "capture.jpeg_quality must be between 1 and 100, got {}",
                self.capture.jpeg_quality
            )));
        }
        if self.detector.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "detector.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Detection service URL: `STAND_DETECT_URL`, then the file, then the default.
    pub fn detector_url(&self) -> String {
        std::env::var(DETECT_URL_ENV)
            .ok()
            .or_else(|| self.detector.url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.detector.timeout_ms)
    }

    pub fn cooldown_policy(&self) -> CooldownPolicy {
        CooldownPolicy {
            after_timeout: Duration::from_millis(self.detector.timeout_cooldown_ms),
            after_server_error: Duration::from_millis(self.detector.server_error_cooldown_ms),
        }
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            period: sample_period(self.capture.samples_per_second),
            jpeg_quality: self.capture.jpeg_quality,
        }
    }

    /// Fixed display size, if both dimensions are configured.
    pub fn display_size(&self) -> Option<DisplaySize> {
        match (self.display.width, self.display.height) {
            (Some(w), Some(h)) => Some(DisplaySize::new(w as f32, h as f32)),
            _ => None,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("stand-capture").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/stand-capture/config.toml")
        })
}
