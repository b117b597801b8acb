//! Settings file management

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PlatformError;
use crate::logs::LogLevel;

pub const DEFAULT_SETTINGS_FILE: &str = "specforge.json";

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Directory for daily rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Health scheduler configuration
    #[serde(default)]
    pub health: HealthSettings,

    /// Provisioning configuration
    #[serde(default)]
    pub deploy: DeploySettings,

    /// Enable the health scheduler
    #[serde(default = "default_true")]
    pub enable_health_worker: bool,

    /// Enable the HTTP API
    #[serde(default = "default_true")]
    pub enable_http_server: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            health: HealthSettings::default(),
            deploy: DeploySettings::default(),
            enable_health_worker: true,
            enable_http_server: true,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file, using defaults when it does not exist
    pub async fn load(path: &Path) -> Result<Self, PlatformError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, PlatformError> {
        let settings: Self = serde_json::from_str(text)
            .map_err(|e| PlatformError::ConfigError(format!("invalid settings file: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), PlatformError> {
        let scale = self.deploy.delay_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PlatformError::ConfigError(format!(
                "deploy.delay_scale must be a positive number, got {}",
                scale
            )));
        }
        if self.health.interval_secs == 0 {
            return Err(PlatformError::ConfigError(
                "health.interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Health scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Seconds between two rounds of checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds before the first round
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Probability that a simulated probe passes
    #[serde(default = "default_pass_rate")]
    pub pass_rate: f64,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_pass_rate() -> f64 {
    0.95
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            pass_rate: default_pass_rate(),
        }
    }
}

/// Provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Multiplier applied to the simulated phase delays
    #[serde(default = "default_delay_scale")]
    pub delay_scale: f64,
}

fn default_delay_scale() -> f64 {
    1.0
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            delay_scale: default_delay_scale(),
        }
    }
}
