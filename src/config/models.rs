// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Member registry: every probe-able endpoint, keyed by name.
    #[serde(default)]
    pub health_checks: Vec<HealthCheckSetting>,

    /// Applications in configuration order.
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSetting {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Health check name must not be empty")]
    EmptyHealthCheckName,

    #[error("Duplicate health check name: {0}")]
    DuplicateHealthCheck(String),

    #[error("Application name must not be empty")]
    EmptyApplicationName,

    #[error("Duplicate application name: {0}")]
    DuplicateApplication(String),

    #[error("Probe timeout must be greater than zero")]
    ZeroProbeTimeout,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for check in &self.health_checks {
            if check.name.is_empty() {
                return Err(ConfigError::EmptyHealthCheckName);
            }
            if !seen.insert(check.name.as_str()) {
                return Err(ConfigError::DuplicateHealthCheck(check.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for app in &self.applications {
            if app.name.is_empty() {
                return Err(ConfigError::EmptyApplicationName);
            }
            if !seen.insert(app.name.as_str()) {
                return Err(ConfigError::DuplicateApplication(app.name.clone()));
            }
        }

        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::ZeroProbeTimeout);
        }

        Ok(())
    }

    /// Exact-name application lookup.
    pub fn application(&self, name: &str) -> Option<&ApplicationConfig> {
        self.applications.iter().find(|app| app.name == name)
    }

    /// Resolves a member name to its probe URI. First registration wins.
    pub fn member_uri(&self, name: &str) -> Option<&str> {
        self.health_checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| check.uri.as_str())
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            base_path: default_base_path(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_base_path() -> String {
    "/api/health".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
