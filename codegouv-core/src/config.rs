//! Codegouv configuration
//!
//! Read from `config.yaml` in the platform config directory
//! (`~/.config/codegouv/` on Linux). Every field has a default, so a missing
//! file or a partial file are both valid.
//!
//! ```yaml
//! source:
//!   snapshot: ./catalog.yaml
//!   api_url: https://catalog.example.gouv.fr/api
//!   timeout_seconds: 30
//! search:
//!   cache_capacity: 4
//! ```

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Environment variable overriding `source.api_url`
pub const API_URL_ENV: &str = "CODEGOUV_API_URL";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const CONFIG_FILE: &str = "config.yaml";

/// Where the catalog is loaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Snapshot file; takes precedence over `api_url`
    pub snapshot: Option<PathBuf>,
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            api_url: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of search indexes kept; one per repository collection
    pub cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { cache_capacity: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegouvConfig {
    pub source: SourceConfig,
    pub search: SearchConfig,
}

impl CodegouvConfig {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                debug!("No platform config directory; using default configuration");
                Self::from_defaults()
            }
        }
    }

    /// Defaults plus environment overrides, validated like a loaded file
    fn from_defaults() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_yaml_ng::from_str(&content)?;
            debug!("Loaded configuration from {}", path.display());
            config
        } else {
            debug!("No configuration at {}; using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `config.yaml` under the platform config directory
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("fr", "codegouv", "codegouv")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                debug!("Using {} from environment", API_URL_ENV);
                self.source.api_url = Some(url);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.cache_capacity == 0 {
            return Err(CatalogError::Config(
                "search.cache_capacity must be at least 1".to_string(),
            ));
        }

        if let Some(url) = &self.source.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CatalogError::Config(format!(
                    "source.api_url must be an http(s) URL (got: {url})"
                )));
            }
        }

        Ok(())
    }

    /// Search cache bound as a non-zero size
    pub fn search_cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.search.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
