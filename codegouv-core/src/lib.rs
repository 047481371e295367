//! Codegouv catalog library exports

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
