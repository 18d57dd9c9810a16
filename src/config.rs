use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::version::types::Ecosystem;

// =============================================================================
// Defaults
// =============================================================================

/// Default cache TTL in seconds (1 hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

/// Default upper bound on cached results
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default number of lookups resolved at the same time
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default per-lookup timeout in milliseconds (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

pub const ENV_CACHE_TTL_SECONDS: &str = "PACKAGE_VERSION_CACHE_TTL_SECONDS";
pub const ENV_CACHE_MAX_ENTRIES: &str = "PACKAGE_VERSION_CACHE_MAX_ENTRIES";
pub const ENV_CONCURRENCY: &str = "PACKAGE_VERSION_CONCURRENCY";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_PAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolver configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    pub cache: CacheConfig,
    /// Maximum number of registry resolutions running at once
    pub concurrency: usize,
    /// How long one caller waits for a lookup, in milliseconds
    pub request_timeout_ms: u64,
    /// GitHub token for GitHub Actions and Swift lookups
    pub github_token: Option<String>,
    pub registries: HashMap<Ecosystem, RegistryConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            github_token: None,
            registries: HashMap::new(),
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Time-to-live of a cached result in seconds
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

/// Individual registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub enabled: bool,
    /// Replaces the public registry endpoint (mirrors, proxies)
    pub base_url: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

impl ResolverConfig {
    /// Defaults, then the JSON file, then environment overrides
    ///
    /// Without an explicit path, `<data_dir>/config.json` is read when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `PACKAGE_VERSION_*` and `GITHUB_PAT` overrides
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ttl) = parse_env(&lookup, ENV_CACHE_TTL_SECONDS) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(max_entries) = parse_env(&lookup, ENV_CACHE_MAX_ENTRIES) {
            self.cache.max_entries = max_entries;
        }
        if let Some(concurrency) = parse_env(&lookup, ENV_CONCURRENCY) {
            self.concurrency = concurrency;
        }
        if let Some(token) = lookup(ENV_GITHUB_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token);
        }
    }

    pub fn registry(&self, ecosystem: Ecosystem) -> RegistryConfig {
        self.registries.get(&ecosystem).cloned().unwrap_or_default()
    }

    pub fn is_enabled(&self, ecosystem: Ecosystem) -> bool {
        self.registry(ecosystem).enabled
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}

/// Returns the path to the data directory for version-resolver.
/// Uses $XDG_DATA_HOME/version-resolver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-resolver,
/// or ./version-resolver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("version-resolver.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-resolver")
}
