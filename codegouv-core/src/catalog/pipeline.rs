//! Selection pipeline: raw catalog state to displayed repositories
//!
//! Stages run in a fixed order, each a no-op unless its trigger holds:
//!
//! ```text
//! hide-experimental → search → administration → category → dependency
//!   → function → vitality → language → licence → dev-status
//!   → organisation → sort
//! ```
//!
//! Results are memoized on a `PipelineKey`. Running again with an equal key
//! returns the very same `Arc`, so consumers can detect changes with
//! `Arc::ptr_eq`.

use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace};

use super::filters;
use super::model::{CollectionId, Repository};
use super::search::{CollectionKey, SearchCache};
use super::sort::sort_repositories;
use super::state::{CatalogState, SelectionState};

/// One step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    HideExperimental,
    Search,
    Administration,
    Category,
    Dependency,
    Function,
    Vitality,
    Language,
    Licence,
    DevStatus,
    Organisation,
    Sort,
}

impl Stage {
    /// Execution order
    pub const ORDER: [Stage; 12] = [
        Stage::HideExperimental,
        Stage::Search,
        Stage::Administration,
        Stage::Category,
        Stage::Dependency,
        Stage::Function,
        Stage::Vitality,
        Stage::Language,
        Stage::Licence,
        Stage::DevStatus,
        Stage::Organisation,
        Stage::Sort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::HideExperimental => "hide-experimental",
            Stage::Search => "search",
            Stage::Administration => "administration",
            Stage::Category => "category",
            Stage::Dependency => "dependency",
            Stage::Function => "function",
            Stage::Vitality => "vitality",
            Stage::Language => "language",
            Stage::Licence => "licence",
            Stage::DevStatus => "dev-status",
            Stage::Organisation => "organisation",
            Stage::Sort => "sort",
        }
    }

    /// Whether the stage changes anything for this selection
    pub fn is_triggered(&self, selection: &SelectionState) -> bool {
        match self {
            Stage::HideExperimental => selection.is_experimental_repos_hidden,
            Stage::Search => !selection.search.is_empty(),
            Stage::Administration => !selection.selected_administrations.is_empty(),
            Stage::Category => !selection.selected_categories.is_empty(),
            Stage::Dependency => !selection.selected_dependencies.is_empty(),
            Stage::Function => !selection.selected_functions.is_empty(),
            Stage::Vitality => selection.selected_vitality.is_some(),
            Stage::Language => !selection.selected_languages.is_empty(),
            Stage::Licence => !selection.selected_licences.is_empty(),
            Stage::DevStatus => !selection.selected_dev_status.is_empty(),
            Stage::Organisation => !selection.selected_organisations.is_empty(),
            Stage::Sort => true,
        }
    }

    fn apply<'a>(
        &self,
        state: &'a CatalogState,
        search: &mut SearchCache,
        repos: Vec<&'a Repository>,
    ) -> Vec<&'a Repository> {
        let selection = &state.selection;
        match self {
            Stage::HideExperimental => filters::hide_experimental(repos),
            Stage::Search => {
                let key = CollectionKey {
                    collection: state.repositories.id(),
                    experimental_hidden: selection.is_experimental_repos_hidden,
                };
                search.filter(key, repos, &selection.search)
            }
            Stage::Administration => filters::by_administration(
                repos,
                state.organisations.items(),
                &selection.selected_administrations,
            ),
            Stage::Category => filters::by_category(repos, &selection.selected_categories),
            Stage::Dependency => filters::by_dependency(
                repos,
                state.dependencies.items(),
                &selection.selected_dependencies,
            ),
            Stage::Function => filters::by_function(repos, &selection.selected_functions),
            Stage::Vitality => filters::by_vitality(repos, selection.selected_vitality),
            Stage::Language => filters::by_language(repos, &selection.selected_languages),
            Stage::Licence => filters::by_licence(repos, &selection.selected_licences),
            Stage::DevStatus => filters::by_dev_status(repos, &selection.selected_dev_status),
            Stage::Organisation => {
                filters::by_organisation(repos, &selection.selected_organisations)
            }
            Stage::Sort => sort_repositories(repos, selection.sort),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage, as reported by `SelectionPipeline::explain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub triggered: bool,
    pub remaining: usize,
}

/// Every input the displayed collection depends on.
///
/// Recompute iff any component differs from the previous run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineKey {
    pub repositories: CollectionId,
    pub organisations: CollectionId,
    pub dependencies: CollectionId,
    pub selection: SelectionState,
}

impl PipelineKey {
    pub fn of(state: &CatalogState) -> Self {
        Self {
            repositories: state.repositories.id(),
            organisations: state.organisations.id(),
            dependencies: state.dependencies.id(),
            selection: state.selection.clone(),
        }
    }
}

/// Memoizing executor for the stage list
pub struct SelectionPipeline {
    search: SearchCache,
    last: Option<(PipelineKey, Arc<Vec<Repository>>)>,
    function_options: Option<(CollectionId, Arc<Vec<String>>)>,
    recomputations: u64,
}

impl SelectionPipeline {
    /// Create a pipeline whose search cache keeps up to `search_cache_capacity` indexes
    pub fn new(search_cache_capacity: NonZeroUsize) -> Self {
        Self {
            search: SearchCache::new(search_cache_capacity),
            last: None,
            function_options: None,
            recomputations: 0,
        }
    }

    /// Displayed repositories for the current state
    pub fn run(&mut self, state: &CatalogState) -> Arc<Vec<Repository>> {
        let key = PipelineKey::of(state);
        if let Some((last_key, output)) = &self.last {
            if *last_key == key {
                return Arc::clone(output);
            }
        }

        let selected = self.execute(state, None);
        let output = Arc::new(selected.into_iter().cloned().collect::<Vec<_>>());
        self.recomputations += 1;
        debug!(
            "Recomputed filtered repositories: {} of {} (run #{})",
            output.len(),
            state.repositories.items().len(),
            self.recomputations
        );

        self.last = Some((key, Arc::clone(&output)));
        output
    }

    /// Run every stage and report how many repositories each one kept.
    ///
    /// Bypasses the result memo but shares the search cache.
    pub fn explain(&mut self, state: &CatalogState) -> Vec<StageReport> {
        let mut reports = Vec::with_capacity(Stage::ORDER.len());
        self.execute(state, Some(&mut reports));
        reports
    }

    fn execute<'a>(
        &mut self,
        state: &'a CatalogState,
        mut reports: Option<&mut Vec<StageReport>>,
    ) -> Vec<&'a Repository> {
        let mut repos: Vec<&'a Repository> = state.repositories.items().iter().collect();

        for stage in Stage::ORDER {
            let triggered = stage.is_triggered(&state.selection);
            if triggered {
                let before = repos.len();
                repos = stage.apply(state, &mut self.search, repos);
                trace!(stage = stage.as_str(), before, after = repos.len(), "stage applied");
            }
            if let Some(reports) = reports.as_deref_mut() {
                reports.push(StageReport {
                    stage,
                    triggered,
                    remaining: repos.len(),
                });
            }
        }

        repos
    }

    /// De-duplicated repository kinds over the full collection, first-seen order
    pub fn function_options(&mut self, state: &CatalogState) -> Arc<Vec<String>> {
        let id = state.repositories.id();
        if let Some((cached_id, options)) = &self.function_options {
            if *cached_id == id {
                return Arc::clone(options);
            }
        }

        let options = Arc::new(distinct(
            state
                .repositories
                .items()
                .iter()
                .flat_map(|repo| repo.kind.iter()),
        ));
        self.function_options = Some((id, Arc::clone(&options)));
        options
    }

    /// Number of times the displayed collection was actually recomputed
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn search_cache(&self) -> &SearchCache {
        &self.search
    }

    /// Drop every memoized result and index
    pub fn invalidate(&mut self) {
        self.last = None;
        self.function_options = None;
        self.search.clear();
    }
}

impl Default for SelectionPipeline {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

/// Distinct status labels present in the collection, first-seen order
pub fn present_dev_statuses(repos: &[Repository]) -> Vec<String> {
    distinct(repos.iter().map(|repo| &repo.status))
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(value.as_str()))
        .cloned()
        .collect()
}
