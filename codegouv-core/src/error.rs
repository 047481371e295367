//! Catalog error types

use thiserror::Error;

/// Errors raised by the catalog engine and its upstream port
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A read or update reached the catalog before the initial load completed
    #[error("Catalog is not initialized yet; wait for the initial load to complete")]
    NotInitialized,

    /// `update_filter_from_key` was called with a key outside the selection fields
    #[error("'{0}' is not a filterable selection field")]
    InvalidFacetKey(String),

    /// The key is legal but the value does not have the expected shape
    #[error("Invalid value for '{key}': {message}")]
    InvalidFilterValue { key: String, message: String },

    /// One of the upstream fetches failed during initialization
    #[error("Failed to fetch {resource} from the catalog API")]
    Upstream {
        resource: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A repository with the same name is already loaded
    #[error("Repository '{0}' is already in the catalog")]
    DuplicateRepository(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CatalogError {
    /// Wrap an upstream failure with the name of the resource being fetched
    pub fn upstream(resource: &'static str, source: impl Into<anyhow::Error>) -> Self {
        CatalogError::Upstream {
            resource,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
