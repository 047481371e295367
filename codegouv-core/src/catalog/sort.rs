//! Display ordering for the filtered catalog

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::model::Repository;

/// Sort order selected by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Sort {
    #[default]
    NameAsc,
    NameDesc,
    /// Most recently updated first (the label is kept from the catalog UI)
    LastUpdateAsc,
    /// Least recently updated first
    LastUpdateDesc,
}

impl Sort {
    pub const OPTIONS: [Sort; 4] = [
        Sort::NameAsc,
        Sort::NameDesc,
        Sort::LastUpdateAsc,
        Sort::LastUpdateDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::NameAsc => "name_asc",
            Sort::NameDesc => "name_desc",
            Sort::LastUpdateAsc => "last_update_asc",
            Sort::LastUpdateDesc => "last_update_desc",
        }
    }

    /// Parse a sort key. Unrecognized values fall back to `NameAsc`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "name_desc" => Sort::NameDesc,
            "last_update_asc" => Sort::LastUpdateAsc,
            "last_update_desc" => Sort::LastUpdateDesc,
            _ => Sort::NameAsc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sort {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Sort::from_str_lossy(&value))
    }
}

/// Order repositories into a new sequence.
///
/// The sort is stable: repositories with equal keys keep their input order.
/// `LastUpdateAsc` sorts newest first and `LastUpdateDesc` oldest first,
/// matching the published catalog behaviour.
pub fn sort_repositories<'a>(mut repos: Vec<&'a Repository>, sort: Sort) -> Vec<&'a Repository> {
    match sort {
        Sort::NameAsc => repos.sort_by_cached_key(|repo| CollationKey::new(&repo.name)),
        Sort::NameDesc => repos.sort_by_cached_key(|repo| Reverse(CollationKey::new(&repo.name))),
        Sort::LastUpdateAsc => repos.sort_by_key(|repo| Reverse(repo.last_updated)),
        Sort::LastUpdateDesc => repos.sort_by_key(|repo| repo.last_updated),
    }
    repos
}

/// Compare two names the way a reader expects them listed.
///
/// Letters compare first without case or accents, then accents break ties,
/// then case (lowercase first).
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    base: String,
    accents: String,
    uppercase: Vec<bool>,
    raw: String,
}

impl CollationKey {
    fn new(name: &str) -> Self {
        let decomposed: Vec<char> = name.nfd().collect();

        let base = decomposed
            .iter()
            .filter(|c| !is_combining_mark(**c))
            .flat_map(|c| c.to_lowercase())
            .collect();
        let accents = decomposed.iter().flat_map(|c| c.to_lowercase()).collect();
        let uppercase = decomposed.iter().map(|c| c.is_uppercase()).collect();

        Self {
            base,
            accents,
            uppercase,
            raw: name.to_string(),
        }
    }
}
