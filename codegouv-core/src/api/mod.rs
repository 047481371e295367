//! Upstream catalog API port
//!
//! The catalog is read from an external provider exposing one read
//! operation per collection. Providers:
//!
//! - [`StaticApi`] serves an in-memory payload
//! - [`SnapshotApi`] serves a YAML or JSON snapshot file
//! - `HttpApi` (feature `remote`) reads the public JSON API
//!
//! Failures are never retried here; they propagate to the caller.

mod snapshot;
#[cfg(feature = "remote")]
mod http;

pub use snapshot::{SnapshotApi, StaticApi};
#[cfg(feature = "remote")]
pub use http::HttpApi;

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::{CatalogPayload, Dependency, Organisation, Repository, RepositoryStatistics};
use crate::error::Result;

/// Read-only access to the upstream catalog data
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Provider identifier for logging
    fn name(&self) -> &str;

    async fn fetch_repositories(&self) -> Result<Vec<Repository>>;

    /// Aggregate statistics, passed through untouched
    async fn fetch_repository_statistics(&self) -> Result<RepositoryStatistics>;

    async fn fetch_languages(&self) -> Result<Vec<String>>;

    async fn fetch_licences(&self) -> Result<Vec<String>>;

    async fn fetch_administrations(&self) -> Result<Vec<String>>;

    async fn fetch_dependencies(&self) -> Result<Vec<Dependency>>;

    async fn fetch_organisations(&self) -> Result<Vec<Organisation>>;

    async fn fetch_organisation_names(&self) -> Result<Vec<String>>;

    async fn fetch_categories(&self) -> Result<Vec<String>>;
}

/// Fetch every collection concurrently.
///
/// The fetches are independent; the first failure aborts the load and is
/// returned as is.
pub async fn load_payload(api: &dyn CatalogApi) -> Result<CatalogPayload> {
    debug!("Loading catalog from {}", api.name());

    let (
        repositories,
        repository_statistics,
        languages,
        licences,
        administrations,
        dependencies,
        organisations,
        organisation_names,
        categories,
    ) = futures::try_join!(
        api.fetch_repositories(),
        api.fetch_repository_statistics(),
        api.fetch_languages(),
        api.fetch_licences(),
        api.fetch_administrations(),
        api.fetch_dependencies(),
        api.fetch_organisations(),
        api.fetch_organisation_names(),
        api.fetch_categories(),
    )?;

    Ok(CatalogPayload {
        repositories,
        repository_statistics,
        languages,
        licences,
        administrations,
        dependencies,
        organisations,
        organisation_names,
        categories,
    })
}
