//! Server configuration: a TOML file plus `STATUSBOARD_*` environment overrides.

use serde::Deserialize;
use statusboard_core::{notify, CoreSettings, HttpNotifier, Notifier};
use statusboard_db::DbRuntimeSettings;
use statusboard_types::{IncidentStatus, ServiceSeed};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Presentation and aggregation settings.
    #[serde(default)]
    pub website: WebsiteConfig,

    /// Outbound announcement settings.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Services (and their regions) that must exist at startup.
    #[serde(default)]
    pub services: Vec<ServiceSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Loopback unless overridden.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "statusboard_core=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// One JSON object per line instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// How events are windowed and presented.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteConfig {
    /// Days covered by "latest" incident and maintenance listings.
    #[serde(default = "default_days_to_aggregate")]
    pub days_to_aggregate: i64,

    /// Trailing days the dashboard always shows.
    #[serde(default = "default_empty_days_to_show")]
    pub empty_days_to_show: u32,

    /// Status for incidents created without one.
    #[serde(default)]
    pub default_incident_status: IncidentStatus,
}

/// Outbound announcement endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub enabled: bool,

    /// URL the announcement JSON is posted to.
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token sent with every post.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "statusboard.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_days_to_aggregate() -> i64 {
    CoreSettings::default().days_to_aggregate
}

fn default_empty_days_to_show() -> u32 {
    CoreSettings::default().empty_days_to_show
}

fn default_notifier_timeout_secs() -> u64 {
    notify::DEFAULT_TIMEOUT.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            days_to_aggregate: default_days_to_aggregate(),
            empty_days_to_show: default_empty_days_to_show(),
            default_incident_status: IncidentStatus::default(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            token: String::new(),
            timeout_secs: default_notifier_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl WebsiteConfig {
    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            days_to_aggregate: self.days_to_aggregate,
            default_incident_status: self.default_incident_status,
            empty_days_to_show: self.empty_days_to_show,
        }
    }
}

impl NotifierConfig {
    /// Builds the configured notifier, or `None` when announcements are off.
    pub fn build(&self) -> Option<Arc<dyn Notifier>> {
        if !self.enabled {
            return None;
        }
        if self.endpoint.trim().is_empty() {
            tracing::warn!("notifier enabled without an endpoint, announcements are off");
            return None;
        }
        Some(Arc::new(HttpNotifier::new(
            self.endpoint.trim(),
            self.token.clone(),
            Duration::from_secs(self.timeout_secs),
        )))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// A set, non-blank environment variable.
fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> Option<bool> {
    env(name).map(|v| matches!(v.trim(), "true" | "1"))
}

impl Config {
    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(path: &str, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Applies `STATUSBOARD_*` overrides. Unparseable values are ignored.
    fn apply_env(&mut self) {
        if let Some(host) = env("STATUSBOARD_HOST").and_then(|v| v.parse().ok()) {
            self.server.host = host;
        }
        if let Some(port) = env("STATUSBOARD_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(path) = env("STATUSBOARD_DB_PATH") {
            self.database.path = path;
        }
        if let Some(level) = env("STATUSBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = env_flag("STATUSBOARD_LOG_JSON") {
            self.logging.json = json;
        }
        if let Some(enabled) = env_flag("STATUSBOARD_NOTIFIER_ENABLED") {
            self.notifier.enabled = enabled;
        }
        if let Some(endpoint) = env("STATUSBOARD_NOTIFIER_ENDPOINT") {
            self.notifier.endpoint = endpoint;
        }
        if let Some(token) = env("STATUSBOARD_NOTIFIER_TOKEN") {
            self.notifier.token = token;
        }
    }
}

/// Reads the TOML file at `path` (a missing file means all defaults), then
/// applies environment overrides:
///
/// | variable | field |
/// |---|---|
/// | `STATUSBOARD_HOST`, `STATUSBOARD_PORT` | `server.host`, `server.port` |
/// | `STATUSBOARD_DB_PATH` | `database.path` |
/// | `STATUSBOARD_LOG_LEVEL`, `STATUSBOARD_LOG_JSON` | `logging.level`, `logging.json` |
/// | `STATUSBOARD_NOTIFIER_ENABLED` | `notifier.enabled` |
/// | `STATUSBOARD_NOTIFIER_ENDPOINT`, `STATUSBOARD_NOTIFIER_TOKEN` | `notifier.endpoint`, `notifier.token` |
///
/// # Errors
///
/// `ConfigError` when the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        None => Config::default(),
        Some(path) => match std::fs::read_to_string(path) {
            Ok(contents) => Config::from_toml(path, &contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path, "no config file, using defaults");
                Config::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_string(),
                    source,
                })
            }
        },
    };
    config.apply_env();
    Ok(config)
}
