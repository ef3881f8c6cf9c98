use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{cache, intervals, limits};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub proxy: ProxyConfig,

    pub cache: CacheConfig,

    pub search: SearchConfig,

    pub refresh: RefreshConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            proxy: ProxyConfig::default(),
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the search proxy, without a trailing slash.
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Search pages go stale quickly; freshness matters more than hit rate.
    pub search_ttl_seconds: u64,

    pub search_max_entries: usize,

    /// Handles rarely change identifiers, so these live much longer.
    pub identifier_ttl_seconds: u64,

    pub identifier_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_seconds: cache::SEARCH_TTL_SECONDS,
            search_max_entries: cache::SEARCH_MAX_ENTRIES,
            identifier_ttl_seconds: cache::IDENTIFIER_TTL_SECONDS,
            identifier_max_entries: cache::IDENTIFIER_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Pages fetched per term on the initial search. The rest stays reachable
    /// through load-more so a wide fan-out does not stall the first render.
    pub max_pages: u32,

    /// Pages fetched per term when resuming from a stored cursor.
    pub load_more_pages: u32,

    /// Split multi-word phrases into additional sub-word terms.
    pub expand_terms: bool,

    pub default_min_likes: u64,

    pub default_hours_window: f64,

    /// "top" or "latest"
    pub default_sort: String,

    pub initial_render_limit: usize,

    pub render_limit_step: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pages: limits::MAX_SEARCH_PAGES,
            load_more_pages: limits::LOAD_MORE_PAGES,
            expand_terms: false,
            default_min_likes: 0,
            default_hours_window: limits::DEFAULT_HOURS_WINDOW,
            default_sort: "top".to_string(),
            initial_render_limit: limits::INITIAL_RENDER_LIMIT,
            render_limit_step: limits::RENDER_LIMIT_STEP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,

    pub interval_seconds: u64,

    /// How long freshly surfaced posts stay marked as new.
    pub highlight_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: intervals::REFRESH_DEFAULT_SECONDS,
            highlight_seconds: intervals::HIGHLIGHT_EXPIRY.as_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("skysift").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".skysift").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.proxy.base_url)
            .with_context(|| format!("Invalid proxy base URL: {}", self.proxy.base_url))?;

        if self.search.max_pages == 0 {
            anyhow::bail!("search.max_pages must be > 0");
        }

        if self.refresh.enabled && self.refresh.interval_seconds == 0 {
            anyhow::bail!("refresh.interval_seconds must be > 0 when refresh is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.search_ttl_seconds, 30);
        assert_eq!(config.cache.search_max_entries, 500);
        assert_eq!(config.search.max_pages, 3);
        assert!((config.search.default_hours_window - 24.0).abs() < f64::EPSILON);
        assert!(config.refresh.enabled);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[proxy]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[search]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [search]
            max_pages = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.search.max_pages, 5);

        assert_eq!(config.proxy.base_url, "http://localhost:8787");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.proxy.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
