//! Application configuration options

use std::time::Duration;

use crate::config::Settings;
use crate::deploy::ProvisionSettings;
use crate::workers::health;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Enable the HTTP API
    pub enable_http_server: bool,

    /// Enable the health scheduler
    pub enable_health_worker: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Health worker options
    pub health_worker: health::Options,

    /// Pass probability of the simulated health probe
    pub health_pass_rate: f64,

    /// Simulated provisioning settings
    pub provision: ProvisionSettings,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            enable_http_server: true,
            enable_health_worker: true,
            server: ServerOptions::default(),
            health_worker: health::Options::default(),
            health_pass_rate: crate::health::probe::DEFAULT_PASS_RATE,
            provision: ProvisionSettings::default(),
        }
    }
}

impl AppOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enable_http_server: settings.enable_http_server,
            enable_health_worker: settings.enable_health_worker,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            health_worker: health::Options {
                interval: Duration::from_secs(settings.health.interval_secs),
                initial_delay: Duration::from_secs(settings.health.initial_delay_secs),
            },
            health_pass_rate: settings.health.pass_rate,
            provision: ProvisionSettings {
                delay_scale: settings.deploy.delay_scale,
            },
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP API options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}
