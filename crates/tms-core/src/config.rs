use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Top-level config (tms.toml + TMS_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmsConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Schedule status reconciliation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Bearer secret expected by `/update-schedule-status` and the schedule
    /// edit endpoints. Unset (or empty) leaves the trigger open, which is
    /// how cron callers on a private network usually run it.
    /// Override with env var: TMS_RECONCILE__SECRET=...
    #[serde(default)]
    pub secret: Option<String>,
    /// When set, the gateway runs a bulk reconciliation every N seconds.
    /// Leave unset when an external scheduler hits the HTTP trigger.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl ReconcileConfig {
    /// The configured secret, treating an empty string as "not configured".
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tms/tms.db", home)
}

impl TmsConfig {
    /// Load config from a TOML file with TMS_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.tms/tms.toml
    ///
    /// A missing file is not an error; every field has a default. A file or
    /// env var that is present but malformed is an error.
    /// Nested keys use a double underscore: `TMS_GATEWAY__PORT=8080`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TmsConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TMS_").split("__"))
            .extract()
            .map_err(|e| crate::error::TmsError::Config(e.to_string()))?;

        tracing::debug!(path = %path, "configuration loaded");
        Ok(config)
    }

    /// Socket address string the gateway binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.gateway.bind, self.gateway.port)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tms/tms.toml", home)
}
