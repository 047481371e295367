//! Catalog browsing engine
//!
//! Holds the public catalog of government repositories in memory and turns
//! the user's current selection into the list of repositories to display.
//!
//! # Architecture
//!
//! ```text
//! CatalogApi (snapshot, HTTP)
//!     │  load_payload: nine concurrent fetches
//!     ▼
//! CatalogStore ── NotReady │ Ready(CatalogState)
//!     │                          ├── collections (Arc, id per load)
//!     │                          └── SelectionState
//!     ▼
//! SelectionPipeline
//!     ├── hide-experimental → search → ... → organisation → sort
//!     └── memo keyed on PipelineKey
//!            │
//!            ▼
//!     Catalog::filtered_repositories
//! ```

mod browser;
mod filters;
mod model;
mod pipeline;
mod search;
mod sort;
mod state;

pub use browser::Catalog;
pub use filters::VitalityRange;
pub use model::{
    CatalogPayload, CollectionId, Dependency, DevStatus, Organisation, Repository,
    RepositoryStatistics,
};
pub use pipeline::{present_dev_statuses, PipelineKey, SelectionPipeline, Stage, StageReport};
pub use search::{CollectionKey, SearchCache, SearchIndex};
pub use sort::{collate, sort_repositories, Sort};
pub use state::{
    CatalogState, CatalogStore, Collection, FacetKey, FilterUpdate, SelectionState,
};
