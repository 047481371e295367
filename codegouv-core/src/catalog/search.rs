//! Fuzzy name search
//!
//! A `SearchIndex` holds the repository names of one collection, converted
//! once for the matcher. Match rank is discarded: the search stage only
//! decides membership, the sort stage decides display order.

use lru::LruCache;
use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32String};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tracing::debug;

use super::model::{CollectionId, Repository};

/// Identifies the collection the search stage runs over.
///
/// Search always runs right after the experimental filter, so its input is
/// fully determined by the loaded collection and that flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    pub collection: CollectionId,
    pub experimental_hidden: bool,
}

/// Searchable view over the names of one repository collection
pub struct SearchIndex {
    names: Vec<String>,
    haystacks: Vec<Utf32String>,
    matcher: Matcher,
    last_query: Option<(String, HashSet<String>)>,
}

impl SearchIndex {
    /// Build an index over the given repositories
    pub fn build(repos: &[&Repository]) -> Self {
        Self {
            names: repos.iter().map(|repo| repo.name.clone()).collect(),
            haystacks: repos
                .iter()
                .map(|repo| Utf32String::from(repo.name.as_str()))
                .collect(),
            matcher: Matcher::new(Config::DEFAULT),
            last_query: None,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names matching the query.
    ///
    /// The last query's result is kept, so asking again for the same query
    /// does not re-run the matcher.
    pub fn matches(&mut self, query: &str) -> &HashSet<String> {
        let cached = matches!(&self.last_query, Some((last, _)) if last == query);
        if !cached {
            let found = self.evaluate(query);
            self.last_query = Some((query.to_string(), found));
        }

        let (_, found) = self
            .last_query
            .get_or_insert_with(|| (query.to_string(), HashSet::new()));
        found
    }

    fn evaluate(&mut self, query: &str) -> HashSet<String> {
        // one atom: spaces are part of the subsequence, not word separators
        let atom = Atom::new(
            query,
            CaseMatching::Smart,
            Normalization::Smart,
            AtomKind::Fuzzy,
            true,
        );

        let Self {
            names,
            haystacks,
            matcher,
            ..
        } = self;

        names
            .iter()
            .zip(haystacks.iter())
            .filter(|(_, haystack)| atom.score(haystack.slice(..), matcher).is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Bounded cache of search indexes keyed by collection identity
pub struct SearchCache {
    indexes: LruCache<CollectionKey, SearchIndex>,
    builds: u64,
}

impl SearchCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            indexes: LruCache::new(capacity),
            builds: 0,
        }
    }

    /// Keep the repositories whose name fuzzy-matches the query, in input order.
    ///
    /// An empty query returns the input untouched without building an index.
    pub fn filter<'a>(
        &mut self,
        key: CollectionKey,
        repos: Vec<&'a Repository>,
        query: &str,
    ) -> Vec<&'a Repository> {
        if query.is_empty() {
            return repos;
        }

        if let Some(index) = self.indexes.get_mut(&key) {
            return retain_matches(repos, index.matches(query));
        }

        debug!(
            "Building search index over {} repositories ({:?})",
            repos.len(),
            key
        );
        let mut index = SearchIndex::build(&repos);
        self.builds += 1;
        let result = retain_matches(repos, index.matches(query));
        self.indexes.put(key, index);
        result
    }

    /// Number of indexes built since creation
    pub fn index_builds(&self) -> u64 {
        self.builds
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.indexes.cap().get()
    }

    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

fn retain_matches<'a>(repos: Vec<&'a Repository>, names: &HashSet<String>) -> Vec<&'a Repository> {
    repos
        .into_iter()
        .filter(|repo| names.contains(&repo.name))
        .collect()
}
