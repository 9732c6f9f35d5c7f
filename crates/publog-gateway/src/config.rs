//! Gateway settings.
//!
//! [`GatewayConfig`] covers the HTTP surface. [`Settings`] pairs it with the
//! [`ServiceConfig`] of the dataset service and reads both from the process
//! environment.

use std::path::PathBuf;
use std::time::Duration;

use publog_service::ServiceConfig;
use serde::Deserialize;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Every endpoint takes its input from the path and query string.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Long enough for a full initialize, which runs inside one request.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15 * 60;

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_owned()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_owned()]
}

const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// HTTP surface settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Socket address the server binds.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origins allowed by CORS; `*` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_seconds: u64,

    /// Load the priority tier before serving.
    #[serde(default)]
    pub init_priority: bool,
}

impl GatewayConfig {
    /// The per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_seconds: default_request_timeout_secs(),
            init_priority: false,
        }
    }
}

/// Everything the gateway binary needs to start.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// HTTP surface.
    pub gateway: GatewayConfig,
    /// Dataset locations and query limits.
    pub service: ServiceConfig,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// | Variable               | Setting                                   |
    /// |------------------------|-------------------------------------------|
    /// | `DATA_DIR`             | root of the flat-file datasets            |
    /// | `DB_PATH`              | embedded database file                    |
    /// | `LISTEN_ADDR`          | bind address                              |
    /// | `CORS_ORIGINS`         | comma-separated allowed origins           |
    /// | `PUBLOG_INIT_PRIORITY` | `1`, `true` or `yes` to preload priority  |
    ///
    /// Unset variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` instead of the process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(dir) = lookup("DATA_DIR") {
            settings.service.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DB_PATH") {
            settings.service.db_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("LISTEN_ADDR") {
            settings.gateway.listen_addr = addr;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            settings.gateway.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(flag) = lookup("PUBLOG_INIT_PRIORITY") {
            settings.gateway.init_priority =
                matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        settings
    }
}
