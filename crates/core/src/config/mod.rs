//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SW_CACHE_*)
//! 2. TOML config file (if SW_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The route table is the only tuning surface for caching behavior; it is
//! read once at startup and never changed at runtime.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::routes::{RouteRuleConfig, RouteTable, default_rules};

mod validation;

pub use validation::ConfigError;

/// Per-client request budget for the server's fetch tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_requests")]
    pub max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: default_rate_limit_requests(), window_secs: default_rate_limit_window_secs() }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SW_CACHE_*)
/// 2. TOML config file (if SW_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache storage.
    ///
    /// Set via SW_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that relative URLs (install manifest, cache updates) resolve against.
    ///
    /// Set via SW_CACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag appended to every partition name.
    ///
    /// Bumping it makes activation drop all caches of the previous version.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional cap on total stored body bytes.
    #[serde(default)]
    pub quota_bytes: Option<u64>,

    /// Paths pre-fetched into the static partition at install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Max-age stored with pre-cached assets.
    #[serde(default = "default_precache_max_age_secs")]
    pub precache_max_age_secs: u64,

    /// Ordered route table; first match wins.
    #[serde(default = "default_rules")]
    pub routes: Vec<RouteRuleConfig>,

    /// Coalesce concurrent background revalidations of the same request.
    #[serde(default)]
    pub dedupe_revalidation: bool,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/manifest.json".into(), "/favicon.ico".into()]
}

fn default_precache_max_age_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_rate_limit_requests() -> u32 {
    60
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            quota_bytes: None,
            precache: default_precache(),
            precache_max_age_secs: default_precache_max_age_secs(),
            routes: default_rules(),
            dedupe_revalidation: false,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, a value cannot be
    /// parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SW_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SW_CACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Compile the configured route table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first rule whose pattern
    /// does not compile.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        RouteTable::compile(&self.routes)
            .map_err(|e| ConfigError::Invalid { field: "routes".into(), reason: e.to_string() })
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let url = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme {scheme}") }),
        }
    }
}
