//! Catalog entities as delivered by the upstream API
//!
//! Every collection is loaded once and replaced wholesale; nothing here is
//! mutated in place after a load.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A public-sector source repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name, unique within one loaded collection
    pub name: String,

    /// Canonical repository URL (joined against dependency usage)
    pub url: String,

    /// Owning organisation, as displayed by the forge
    pub organisation_name: String,

    /// Languages detected in the repository
    #[serde(default)]
    pub language: Vec<String>,

    /// SPDX licence identifiers
    #[serde(default)]
    pub license: Vec<String>,

    /// Forge topics, used as catalog categories
    #[serde(default)]
    pub topics: Vec<String>,

    /// Functional kind ("Library", "Algorithm", "Source Code")
    #[serde(rename = "type", default)]
    pub kind: Vec<String>,

    /// Development status label
    #[serde(default)]
    pub status: String,

    /// Activity score
    #[serde(default)]
    pub vitality: f64,

    /// Last update, milliseconds since the Unix epoch
    #[serde(default)]
    pub last_updated: i64,

    #[serde(default)]
    pub is_experimental: bool,
}

/// An organisation and the administrations it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub name: String,
    #[serde(default)]
    pub administrations: Vec<String>,
}

/// A dependency and the repositories using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub repository_urls: Vec<String>,
}

/// Aggregate statistics computed upstream; never inspected by the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryStatistics(pub serde_json::Value);

/// Development status of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevStatus {
    Concept,
    Alpha,
    Beta,
    Rc,
    Stable,
}

impl DevStatus {
    /// Options offered by the dev-status facet, in display order
    pub const OPTIONS: [DevStatus; 5] = [
        DevStatus::Beta,
        DevStatus::Rc,
        DevStatus::Concept,
        DevStatus::Alpha,
        DevStatus::Stable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevStatus::Concept => "Concept",
            DevStatus::Alpha => "Alpha",
            DevStatus::Beta => "Beta",
            DevStatus::Rc => "RC",
            DevStatus::Stable => "Stable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Concept" => Some(DevStatus::Concept),
            "Alpha" => Some(DevStatus::Alpha),
            "Beta" => Some(DevStatus::Beta),
            "RC" => Some(DevStatus::Rc),
            "Stable" => Some(DevStatus::Stable),
            _ => None,
        }
    }
}

impl fmt::Display for DevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DevStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DevStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        DevStatus::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown dev status '{value}'")))
    }
}

/// Everything the initial load delivers, replaced atomically
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub repository_statistics: RepositoryStatistics,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub licences: Vec<String>,
    #[serde(default)]
    pub administrations: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub organisations: Vec<Organisation>,
    #[serde(default)]
    pub organisation_names: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one built collection.
///
/// A fresh id is minted every time a collection is (re)built, so two equal
/// ids always denote the very same collection contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(u64);

impl CollectionId {
    pub fn mint() -> Self {
        CollectionId(NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}
