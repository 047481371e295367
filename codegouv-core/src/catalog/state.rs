//! Catalog state: loaded collections plus the user's current selection
//!
//! The store is either `NotReady` or `Ready`. Every read goes through
//! `CatalogStore::state`, which yields `CatalogError::NotInitialized` until
//! the first load completes, so a half-built state is never observable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::filters::VitalityRange;
use super::model::{
    CatalogPayload, CollectionId, Dependency, Organisation, Repository, RepositoryStatistics,
};
use super::sort::Sort;
use crate::error::{CatalogError, Result};

/// Current value of every selection field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_administrations: Vec<String>,
    pub selected_categories: Vec<String>,
    pub selected_dependencies: Vec<String>,
    pub selected_functions: Vec<String>,
    pub selected_vitality: Option<VitalityRange>,
    pub selected_languages: Vec<String>,
    pub selected_licences: Vec<String>,
    pub selected_dev_status: Vec<String>,
    pub selected_organisations: Vec<String>,
    pub search: String,
    pub sort: Sort,
    pub is_experimental_repos_hidden: bool,
}

impl SelectionState {
    /// Replace the one field named by the update
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Administrations(v) => self.selected_administrations = v,
            FilterUpdate::Categories(v) => self.selected_categories = v,
            FilterUpdate::Dependencies(v) => self.selected_dependencies = v,
            FilterUpdate::Functions(v) => self.selected_functions = v,
            FilterUpdate::Vitality(v) => self.selected_vitality = v,
            FilterUpdate::Languages(v) => self.selected_languages = v,
            FilterUpdate::Licences(v) => self.selected_licences = v,
            FilterUpdate::DevStatus(v) => self.selected_dev_status = v,
            FilterUpdate::Organisations(v) => self.selected_organisations = v,
            FilterUpdate::Search(v) => self.search = v,
            FilterUpdate::Sort(v) => self.sort = v,
            FilterUpdate::ExperimentalReposHidden(v) => self.is_experimental_repos_hidden = v,
        }
    }
}

/// One legal selection update. There is exactly one variant per field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    Administrations(Vec<String>),
    Categories(Vec<String>),
    Dependencies(Vec<String>),
    Functions(Vec<String>),
    Vitality(Option<VitalityRange>),
    Languages(Vec<String>),
    Licences(Vec<String>),
    DevStatus(Vec<String>),
    Organisations(Vec<String>),
    Search(String),
    Sort(Sort),
    ExperimentalReposHidden(bool),
}

impl FilterUpdate {
    pub fn key(&self) -> FacetKey {
        match self {
            FilterUpdate::Administrations(_) => FacetKey::Administrations,
            FilterUpdate::Categories(_) => FacetKey::Categories,
            FilterUpdate::Dependencies(_) => FacetKey::Dependencies,
            FilterUpdate::Functions(_) => FacetKey::Functions,
            FilterUpdate::Vitality(_) => FacetKey::Vitality,
            FilterUpdate::Languages(_) => FacetKey::Languages,
            FilterUpdate::Licences(_) => FacetKey::Licences,
            FilterUpdate::DevStatus(_) => FacetKey::DevStatus,
            FilterUpdate::Organisations(_) => FacetKey::Organisations,
            FilterUpdate::Search(_) => FacetKey::Search,
            FilterUpdate::Sort(_) => FacetKey::Sort,
            FilterUpdate::ExperimentalReposHidden(_) => FacetKey::ExperimentalReposHidden,
        }
    }

    /// Build an update from a wire key and a JSON value.
    ///
    /// Keys outside the selection fields (`repositories`, `isLoading`, ...)
    /// are rejected with `InvalidFacetKey`. The vitality value is either
    /// `null`, an empty array, a `[min, max]` pair or `{"min", "max"}`.
    pub fn from_key_value(key: &str, value: serde_json::Value) -> Result<Self> {
        let facet: FacetKey = key.parse()?;

        let update = match facet {
            FacetKey::Administrations => FilterUpdate::Administrations(decode(facet, value)?),
            FacetKey::Categories => FilterUpdate::Categories(decode(facet, value)?),
            FacetKey::Dependencies => FilterUpdate::Dependencies(decode(facet, value)?),
            FacetKey::Functions => FilterUpdate::Functions(decode(facet, value)?),
            FacetKey::Vitality => FilterUpdate::Vitality(decode_vitality(value)?),
            FacetKey::Languages => FilterUpdate::Languages(decode(facet, value)?),
            FacetKey::Licences => FilterUpdate::Licences(decode(facet, value)?),
            FacetKey::DevStatus => FilterUpdate::DevStatus(decode(facet, value)?),
            FacetKey::Organisations => FilterUpdate::Organisations(decode(facet, value)?),
            FacetKey::Search => FilterUpdate::Search(decode(facet, value)?),
            FacetKey::Sort => FilterUpdate::Sort(decode(facet, value)?),
            FacetKey::ExperimentalReposHidden => {
                FilterUpdate::ExperimentalReposHidden(decode(facet, value)?)
            }
        };
        Ok(update)
    }
}

fn decode<T: serde::de::DeserializeOwned>(facet: FacetKey, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CatalogError::InvalidFilterValue {
        key: facet.as_str().to_string(),
        message: e.to_string(),
    })
}

fn decode_vitality(value: serde_json::Value) -> Result<Option<VitalityRange>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Pair(Vec<f64>),
        Bounds { min: f64, max: f64 },
    }

    if value.is_null() {
        return Ok(None);
    }

    match decode::<Wire>(FacetKey::Vitality, value)? {
        Wire::Pair(pair) if pair.is_empty() => Ok(None),
        Wire::Pair(pair) if pair.len() == 2 => Ok(Some(VitalityRange::new(pair[0], pair[1]))),
        Wire::Pair(pair) => Err(CatalogError::InvalidFilterValue {
            key: FacetKey::Vitality.as_str().to_string(),
            message: format!("expected [min, max], got {} values", pair.len()),
        }),
        Wire::Bounds { min, max } => Ok(Some(VitalityRange::new(min, max))),
    }
}

/// Names of the selection fields accepted on the dynamic update path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKey {
    Administrations,
    Categories,
    Dependencies,
    Functions,
    Vitality,
    Languages,
    Licences,
    DevStatus,
    Organisations,
    Search,
    Sort,
    ExperimentalReposHidden,
}

impl FacetKey {
    pub const ALL: [FacetKey; 12] = [
        FacetKey::Administrations,
        FacetKey::Categories,
        FacetKey::Dependencies,
        FacetKey::Functions,
        FacetKey::Vitality,
        FacetKey::Languages,
        FacetKey::Licences,
        FacetKey::DevStatus,
        FacetKey::Organisations,
        FacetKey::Search,
        FacetKey::Sort,
        FacetKey::ExperimentalReposHidden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKey::Administrations => "selectedAdministrations",
            FacetKey::Categories => "selectedCategories",
            FacetKey::Dependencies => "selectedDependencies",
            FacetKey::Functions => "selectedFunctions",
            FacetKey::Vitality => "selectedVitality",
            FacetKey::Languages => "selectedLanguages",
            FacetKey::Licences => "selectedLicences",
            FacetKey::DevStatus => "selectedDevStatus",
            FacetKey::Organisations => "selectedOrganisations",
            FacetKey::Search => "search",
            FacetKey::Sort => "sort",
            FacetKey::ExperimentalReposHidden => "isExperimentalReposHidden",
        }
    }
}

impl FromStr for FacetKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        FacetKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CatalogError::InvalidFacetKey(s.to_string()))
    }
}

impl fmt::Display for FacetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded collection together with its identity
#[derive(Debug, Clone)]
pub struct Collection<T> {
    id: CollectionId,
    items: Arc<Vec<T>>,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            id: CollectionId::mint(),
            items: Arc::new(items),
        }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

/// Fully loaded catalog state
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub repositories: Collection<Repository>,
    pub repository_statistics: RepositoryStatistics,
    pub languages: Vec<String>,
    pub licences: Vec<String>,
    pub administrations: Vec<String>,
    pub dependencies: Collection<Dependency>,
    pub organisations: Collection<Organisation>,
    pub organisation_names: Vec<String>,
    pub categories: Vec<String>,
    pub selection: SelectionState,
    pub is_loading: bool,
}

impl CatalogState {
    /// Build a fresh state with the default selection
    pub fn from_payload(payload: CatalogPayload) -> Self {
        Self {
            repositories: Collection::new(payload.repositories),
            repository_statistics: payload.repository_statistics,
            languages: payload.languages,
            licences: payload.licences,
            administrations: payload.administrations,
            dependencies: Collection::new(payload.dependencies),
            organisations: Collection::new(payload.organisations),
            organisation_names: payload.organisation_names,
            categories: payload.categories,
            selection: SelectionState::default(),
            is_loading: false,
        }
    }
}

/// Either not loaded yet or fully loaded
#[derive(Debug, Clone, Default)]
pub enum CatalogStore {
    #[default]
    NotReady,
    Ready(Box<CatalogState>),
}

impl CatalogStore {
    pub fn is_ready(&self) -> bool {
        matches!(self, CatalogStore::Ready(_))
    }

    pub fn state(&self) -> Result<&CatalogState> {
        match self {
            CatalogStore::Ready(state) => Ok(&**state),
            CatalogStore::NotReady => Err(CatalogError::NotInitialized),
        }
    }

    fn state_mut(&mut self) -> Result<&mut CatalogState> {
        match self {
            CatalogStore::Ready(state) => Ok(&mut **state),
            CatalogStore::NotReady => Err(CatalogError::NotInitialized),
        }
    }

    /// Replace every collection and reset the selection to its defaults.
    ///
    /// Upstream data is kept as delivered. Repeated names are logged.
    pub fn initialize(&mut self, payload: CatalogPayload) {
        for name in duplicate_names(&payload.repositories) {
            warn!("Upstream catalog lists repository '{}' more than once", name);
        }
        debug!(
            "Catalog initialized with {} repositories, {} organisations, {} dependencies",
            payload.repositories.len(),
            payload.organisations.len(),
            payload.dependencies.len()
        );
        *self = CatalogStore::Ready(Box::new(CatalogState::from_payload(payload)));
    }

    /// Replace exactly one selection field
    pub fn update_filter(&mut self, update: FilterUpdate) -> Result<()> {
        let state = self.state_mut()?;
        debug!("Selection field {} updated", update.key());
        state.selection.apply(update);
        Ok(())
    }

    pub fn update_sort(&mut self, sort: Sort) -> Result<()> {
        self.update_filter(FilterUpdate::Sort(sort))
    }

    /// Mark a repository submission as in flight
    pub fn begin_add_repository(&mut self) -> Result<()> {
        self.state_mut()?.is_loading = true;
        Ok(())
    }

    /// Append a submitted repository and clear the loading flag.
    ///
    /// The repository collection gets a new identity. A name already present
    /// is rejected and leaves the collection untouched.
    pub fn complete_add_repository(&mut self, repository: Repository) -> Result<()> {
        let state = self.state_mut()?;
        state.is_loading = false;

        let repositories = state.repositories.items();
        if repositories.iter().any(|repo| repo.name == repository.name) {
            warn!("Rejected duplicate repository '{}'", repository.name);
            return Err(CatalogError::DuplicateRepository(repository.name));
        }

        let mut items = repositories.to_vec();
        items.push(repository);
        state.repositories = Collection::new(items);
        Ok(())
    }
}

/// Names carried by more than one repository, first-seen order
pub fn duplicate_names(repositories: &[Repository]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    repositories
        .iter()
        .filter(|repo| !seen.insert(repo.name.as_str()) && reported.insert(repo.name.as_str()))
        .map(|repo| repo.name.clone())
        .collect()
}
