//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: RESOURCE_, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/resource-service/{service_name}/config.toml
//! 4. System directory: /etc/resource-service/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::repository::PageQuery;

const ENV_PREFIX: &str = "RESOURCE_";
const XDG_PREFIX: &str = "resource-service";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Resource layer tuning
    #[serde(default)]
    pub resource: ResourceConfig,

    /// Redis configuration (optional)
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path prefix every resource router is mounted under
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// Knobs shared by every resource service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Lifetime of cached rows in seconds (0 = no expiry)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Page size used when a page request asks for 0
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound on requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Largest accepted request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (redis://host:port)
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: usize,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing Redis connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

fn default_redis_max_connections() -> usize {
    16
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| XDG_PREFIX.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut defaults = Config::default();
        defaults.service.name = service_name.to_string();
        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories. Environment variables still
    /// override the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Candidate config file paths, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Ok(path) = xdg_dirs.place_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(XDG_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Get Redis URL
    pub fn redis_url(&self) -> Option<&str> {
        self.redis.as_ref().map(|r| r.url.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: XDG_PREFIX.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                base_path: default_base_path(),
            },
            resource: ResourceConfig::default(),
            redis: None,
        }
    }
}

/// Per-service settings derived from [`ResourceConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSettings {
    /// Cache entry lifetime; `None` keeps entries until invalidated
    pub cache_ttl: Option<Duration>,
    /// Page size substituted for a requested size of 0
    pub default_page_size: u64,
    /// Largest page size a client may request
    pub max_page_size: u64,
    /// Largest accepted request body in bytes
    pub body_limit_bytes: usize,
}

impl ResourceSettings {
    /// Apply page bounds to a client's page request
    ///
    /// Page 0 becomes page 1, size 0 becomes the default, and larger sizes
    /// are clamped to the maximum.
    pub fn page_query(&self, page: u64, page_size: u64) -> PageQuery {
        let size = match page_size {
            0 => self.default_page_size,
            n => n.min(self.max_page_size),
        };
        PageQuery::new(page, size)
    }
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self::from(&ResourceConfig::default())
    }
}

impl From<&ResourceConfig> for ResourceSettings {
    fn from(config: &ResourceConfig) -> Self {
        Self {
            cache_ttl: (config.cache_ttl_secs > 0)
                .then(|| Duration::from_secs(config.cache_ttl_secs)),
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
            body_limit_bytes: config.body_limit_bytes,
        }
    }
}

impl From<&Config> for ResourceSettings {
    fn from(config: &Config) -> Self {
        Self::from(&config.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.base_path, "/api");
        assert_eq!(config.resource.default_page_size, 20);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "widgets"
port = 9090

[resource]
cache_ttl_secs = 0
max_page_size = 50

[redis]
url = "redis://localhost:6379"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "widgets");
        assert_eq!(config.service.port, 9090);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.resource.max_page_size, 50);
        assert_eq!(config.resource.default_page_size, 20);
        assert_eq!(config.redis_url(), Some("redis://localhost:6379"));
        assert_eq!(config.redis.unwrap().max_retries, 3);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.service.name, "resource-service");
    }

    #[test]
    fn test_settings_zero_ttl_disables_expiry() {
        let mut config = Config::default();
        config.resource.cache_ttl_secs = 0;
        assert_eq!(ResourceSettings::from(&config).cache_ttl, None);

        let settings = ResourceSettings::default();
        assert_eq!(settings.cache_ttl, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_page_query_bounds() {
        let settings = ResourceSettings::default();
        assert_eq!(settings.page_query(0, 0), PageQuery::new(1, 20));
        assert_eq!(settings.page_query(2, 500), PageQuery::new(2, 100));
        assert_eq!(settings.page_query(3, 7), PageQuery::new(3, 7));
    }
}
