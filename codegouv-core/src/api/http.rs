//! HTTP provider for the public catalog API
//!
//! Each collection is one JSON resource under the configured base URL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::CatalogApi;
use crate::catalog::{Dependency, Organisation, Repository, RepositoryStatistics};
use crate::error::{CatalogError, Result};

const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Reads the catalog from the remote JSON API
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let timeout_seconds = if timeout_seconds < MIN_TIMEOUT_SECONDS {
            warn!(
                "Configured timeout_seconds={} is too low; using minimum of {} seconds",
                timeout_seconds, MIN_TIMEOUT_SECONDS
            );
            MIN_TIMEOUT_SECONDS
        } else {
            timeout_seconds
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("codegouv/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, resource: &'static str, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Fetching {} from {}", resource, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::upstream(resource, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::upstream(
                resource,
                anyhow::anyhow!("HTTP {} from {}", status, url),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::upstream(resource, e))
    }
}

#[async_trait]
impl CatalogApi for HttpApi {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        self.get("repositories", "repositories").await
    }

    async fn fetch_repository_statistics(&self) -> Result<RepositoryStatistics> {
        self.get("repository statistics", "repositories/statistics")
            .await
    }

    async fn fetch_languages(&self) -> Result<Vec<String>> {
        self.get("languages", "languages").await
    }

    async fn fetch_licences(&self) -> Result<Vec<String>> {
        self.get("licences", "licences").await
    }

    async fn fetch_administrations(&self) -> Result<Vec<String>> {
        self.get("administrations", "administrations").await
    }

    async fn fetch_dependencies(&self) -> Result<Vec<Dependency>> {
        self.get("dependencies", "dependencies").await
    }

    async fn fetch_organisations(&self) -> Result<Vec<Organisation>> {
        self.get("organisations", "organisations").await
    }

    async fn fetch_organisation_names(&self) -> Result<Vec<String>> {
        self.get("organisation names", "organisations/names").await
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        self.get("categories", "categories").await
    }
}
