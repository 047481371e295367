//! Presentation-facing catalog facade
//!
//! `Catalog` pairs the store with its pipeline. Intents go in through
//! `initialize`, `update_filter` and `update_sort`; the presentation layer
//! reads only the derived outputs below, never the store internals.

use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::info;

use super::model::{CatalogPayload, DevStatus, Repository, RepositoryStatistics};
use super::pipeline::{present_dev_statuses, SelectionPipeline, StageReport};
use super::sort::Sort;
use super::state::{CatalogState, CatalogStore, FilterUpdate, SelectionState};
use crate::api::{load_payload, CatalogApi};
use crate::error::Result;

/// The catalog browser: loaded state plus memoized selectors.
///
/// Queries take `&mut self` because they update the caches; hosts sharing a
/// catalog across threads wrap it in a single owner.
#[derive(Default)]
pub struct Catalog {
    store: CatalogStore,
    pipeline: SelectionPipeline,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog whose search cache keeps up to `capacity` indexes
    pub fn with_search_cache_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            store: CatalogStore::NotReady,
            pipeline: SelectionPipeline::new(capacity),
        }
    }

    /// Fetch everything from the upstream API, then replace the state in one step.
    ///
    /// A failed fetch leaves the catalog exactly as it was.
    pub async fn initialize_from(&mut self, api: &dyn CatalogApi) -> Result<()> {
        let payload = load_payload(api).await?;
        info!(
            "Loaded {} repositories from {}",
            payload.repositories.len(),
            api.name()
        );
        self.initialize(payload);
        Ok(())
    }

    /// Replace every collection and reset the selection
    pub fn initialize(&mut self, payload: CatalogPayload) {
        self.store.initialize(payload);
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    pub fn update_filter(&mut self, update: FilterUpdate) -> Result<()> {
        self.store.update_filter(update)
    }

    /// Dynamic variant of `update_filter` for untyped callers.
    ///
    /// An unknown key or malformed value leaves the state untouched.
    pub fn update_filter_from_key(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        self.store.state()?;
        let update = FilterUpdate::from_key_value(key, value)?;
        self.store.update_filter(update)
    }

    pub fn update_sort(&mut self, sort: Sort) -> Result<()> {
        self.store.update_sort(sort)
    }

    pub fn begin_add_repository(&mut self) -> Result<()> {
        self.store.begin_add_repository()
    }

    pub fn complete_add_repository(&mut self, repository: Repository) -> Result<()> {
        self.store.complete_add_repository(repository)
    }

    /// Repositories to display, filtered and sorted.
    ///
    /// Returns the same `Arc` as the previous call when no input changed.
    pub fn filtered_repositories(&mut self) -> Result<Arc<Vec<Repository>>> {
        let state = self.store.state()?;
        Ok(self.pipeline.run(state))
    }

    /// Per-stage breakdown of the current selection
    pub fn explain(&mut self) -> Result<Vec<StageReport>> {
        let state = self.store.state()?;
        Ok(self.pipeline.explain(state))
    }

    pub fn selection(&self) -> Result<&SelectionState> {
        Ok(&self.state()?.selection)
    }

    pub fn is_loading(&self) -> Result<bool> {
        Ok(self.state()?.is_loading)
    }

    pub fn repository_statistics(&self) -> Result<&RepositoryStatistics> {
        Ok(&self.state()?.repository_statistics)
    }

    pub fn repository_count(&self) -> Result<usize> {
        Ok(self.state()?.repositories.items().len())
    }

    pub fn sort_options(&self) -> [Sort; 4] {
        Sort::OPTIONS
    }

    pub fn administration_options(&self) -> Result<&[String]> {
        Ok(&self.state()?.administrations)
    }

    pub fn category_options(&self) -> Result<&[String]> {
        Ok(&self.state()?.categories)
    }

    pub fn dependency_options(&self) -> Result<Vec<String>> {
        Ok(self
            .state()?
            .dependencies
            .items()
            .iter()
            .map(|dependency| dependency.name.clone())
            .collect())
    }

    /// Repository kinds present in the full collection, not the filtered one
    pub fn function_options(&mut self) -> Result<Arc<Vec<String>>> {
        let state = self.store.state()?;
        Ok(self.pipeline.function_options(state))
    }

    pub fn language_options(&self) -> Result<&[String]> {
        Ok(&self.state()?.languages)
    }

    pub fn licence_options(&self) -> Result<&[String]> {
        Ok(&self.state()?.licences)
    }

    /// The fixed dev-status list. Does not depend on the loaded data.
    pub fn dev_status_options(&self) -> [DevStatus; 5] {
        DevStatus::OPTIONS
    }

    /// Status labels actually present in the loaded repositories
    pub fn present_dev_statuses(&self) -> Result<Vec<String>> {
        Ok(present_dev_statuses(self.state()?.repositories.items()))
    }

    pub fn organisation_options(&self) -> Result<&[String]> {
        Ok(&self.state()?.organisation_names)
    }

    /// Number of pipeline recomputations so far
    pub fn recomputations(&self) -> u64 {
        self.pipeline.recomputations()
    }

    fn state(&self) -> Result<&CatalogState> {
        self.store.state()
    }
}
