//! Local catalog providers
//!
//! A snapshot is one file holding every collection, using the same field
//! names as the initialization payload:
//!
//! ```yaml
//! repositories:
//!   - name: sill
//!     url: https://github.com/codegouvfr/sill
//!     organisation_name: codegouvfr
//! repositoryStatistics: {}
//! languages: [TypeScript]
//! organisationNames: [codegouvfr]
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::CatalogApi;
use crate::catalog::{CatalogPayload, Dependency, Organisation, Repository, RepositoryStatistics};
use crate::error::{CatalogError, Result};

/// Provider serving a payload held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticApi {
    payload: CatalogPayload,
}

impl StaticApi {
    pub fn new(payload: CatalogPayload) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &CatalogPayload {
        &self.payload
    }
}

#[async_trait]
impl CatalogApi for StaticApi {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        Ok(self.payload.repositories.clone())
    }

    async fn fetch_repository_statistics(&self) -> Result<RepositoryStatistics> {
        Ok(self.payload.repository_statistics.clone())
    }

    async fn fetch_languages(&self) -> Result<Vec<String>> {
        Ok(self.payload.languages.clone())
    }

    async fn fetch_licences(&self) -> Result<Vec<String>> {
        Ok(self.payload.licences.clone())
    }

    async fn fetch_administrations(&self) -> Result<Vec<String>> {
        Ok(self.payload.administrations.clone())
    }

    async fn fetch_dependencies(&self) -> Result<Vec<Dependency>> {
        Ok(self.payload.dependencies.clone())
    }

    async fn fetch_organisations(&self) -> Result<Vec<Organisation>> {
        Ok(self.payload.organisations.clone())
    }

    async fn fetch_organisation_names(&self) -> Result<Vec<String>> {
        Ok(self.payload.organisation_names.clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        Ok(self.payload.categories.clone())
    }
}

/// Provider backed by a snapshot file (`.json`, otherwise YAML)
#[derive(Debug, Clone)]
pub struct SnapshotApi {
    path: PathBuf,
    inner: StaticApi,
}

impl SnapshotApi {
    /// Read and parse the snapshot
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CatalogError::upstream(
                "snapshot",
                anyhow::Error::new(e).context(format!("reading {}", path.display())),
            )
        })?;

        let payload = Self::parse(&path, &content)?;
        debug!(
            "Opened snapshot {} ({} repositories)",
            path.display(),
            payload.repositories.len()
        );

        Ok(Self {
            path,
            inner: StaticApi::new(payload),
        })
    }

    fn parse(path: &Path, content: &str) -> Result<CatalogPayload> {
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let payload = if is_json {
            serde_json::from_str(content)?
        } else {
            serde_yaml_ng::from_str(content)?
        };
        Ok(payload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogApi for SnapshotApi {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        self.inner.fetch_repositories().await
    }

    async fn fetch_repository_statistics(&self) -> Result<RepositoryStatistics> {
        self.inner.fetch_repository_statistics().await
    }

    async fn fetch_languages(&self) -> Result<Vec<String>> {
        self.inner.fetch_languages().await
    }

    async fn fetch_licences(&self) -> Result<Vec<String>> {
        self.inner.fetch_licences().await
    }

    async fn fetch_administrations(&self) -> Result<Vec<String>> {
        self.inner.fetch_administrations().await
    }

    async fn fetch_dependencies(&self) -> Result<Vec<Dependency>> {
        self.inner.fetch_dependencies().await
    }

    async fn fetch_organisations(&self) -> Result<Vec<Organisation>> {
        self.inner.fetch_organisations().await
    }

    async fn fetch_organisation_names(&self) -> Result<Vec<String>> {
        self.inner.fetch_organisation_names().await
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        self.inner.fetch_categories().await
    }
}
