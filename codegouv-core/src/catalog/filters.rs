//! Facet predicates
//!
//! Each filter takes the repositories that survived the previous stage and
//! returns the ones matching the selection. An empty selection lets every
//! repository through. String facets use "contains any of" semantics:
//! list-valued fields match on element membership, scalar fields
//! (`status`, `organisation_name`) match on substring.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::model::{Dependency, Organisation, Repository};

/// Inclusive vitality bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalityRange {
    pub min: f64,
    pub max: f64,
}

impl VitalityRange {
    /// Build a range, swapping reversed bounds
    pub fn new(min: f64, max: f64) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn contains(&self, vitality: f64) -> bool {
        self.min <= vitality && vitality <= self.max
    }
}

/// Drop repositories flagged as experimental
pub fn hide_experimental(repos: Vec<&Repository>) -> Vec<&Repository> {
    repos.into_iter().filter(|repo| !repo.is_experimental).collect()
}

/// Keep repositories owned by an organisation attached to one of the
/// selected administrations.
///
/// Administrations are linked to repositories only through organisations,
/// so the selection is first resolved to organisation names.
pub fn by_administration<'a>(
    repos: Vec<&'a Repository>,
    organisations: &[Organisation],
    selected: &[String],
) -> Vec<&'a Repository> {
    if selected.is_empty() {
        return repos;
    }

    let resolved: Vec<&str> = organisations
        .iter()
        .filter(|organisation| {
            organisation
                .administrations
                .iter()
                .any(|administration| selected.contains(administration))
        })
        .map(|organisation| organisation.name.as_str())
        .collect();

    repos
        .into_iter()
        .filter(|repo| {
            resolved
                .iter()
                .any(|name| repo.organisation_name.contains(name))
        })
        .collect()
}

/// Keep repositories tagged with one of the selected categories (topics)
pub fn by_category<'a>(repos: Vec<&'a Repository>, selected: &[String]) -> Vec<&'a Repository> {
    retain_any_in_list(repos, selected, |repo| &repo.topics)
}

/// Keep repositories that use one of the selected dependencies.
///
/// Dependencies list the URLs of the repositories using them; a repository
/// matches when its own URL is in the union of those lists.
pub fn by_dependency<'a>(
    repos: Vec<&'a Repository>,
    dependencies: &[Dependency],
    selected: &[String],
) -> Vec<&'a Repository> {
    if selected.is_empty() {
        return repos;
    }

    let urls: HashSet<&str> = dependencies
        .iter()
        .filter(|dependency| selected.contains(&dependency.name))
        .flat_map(|dependency| dependency.repository_urls.iter().map(String::as_str))
        .collect();

    repos
        .into_iter()
        .filter(|repo| urls.contains(repo.url.as_str()))
        .collect()
}

/// Keep repositories whose functional kind is one of the selected functions
pub fn by_function<'a>(repos: Vec<&'a Repository>, selected: &[String]) -> Vec<&'a Repository> {
    retain_any_in_list(repos, selected, |repo| &repo.kind)
}

/// Keep repositories whose vitality lies within the range, bounds included
pub fn by_vitality<'a>(
    repos: Vec<&'a Repository>,
    range: Option<VitalityRange>,
) -> Vec<&'a Repository> {
    match range {
        Some(range) => repos
            .into_iter()
            .filter(|repo| range.contains(repo.vitality))
            .collect(),
        None => repos,
    }
}

pub fn by_language<'a>(repos: Vec<&'a Repository>, selected: &[String]) -> Vec<&'a Repository> {
    retain_any_in_list(repos, selected, |repo| &repo.language)
}

pub fn by_licence<'a>(repos: Vec<&'a Repository>, selected: &[String]) -> Vec<&'a Repository> {
    retain_any_in_list(repos, selected, |repo| &repo.license)
}

/// Keep repositories whose status label contains one of the selected statuses
pub fn by_dev_status<'a>(repos: Vec<&'a Repository>, selected: &[String]) -> Vec<&'a Repository> {
    retain_any_substring(repos, selected, |repo| &repo.status)
}

/// Keep repositories whose organisation name contains one of the selected names
pub fn by_organisation<'a>(
    repos: Vec<&'a Repository>,
    selected: &[String],
) -> Vec<&'a Repository> {
    retain_any_substring(repos, selected, |repo| &repo.organisation_name)
}

fn retain_any_in_list<'a, F>(
    repos: Vec<&'a Repository>,
    selected: &[String],
    field: F,
) -> Vec<&'a Repository>
where
    F: Fn(&Repository) -> &Vec<String>,
{
    if selected.is_empty() {
        return repos;
    }
    repos
        .into_iter()
        .filter(|repo| selected.iter().any(|value| field(repo).contains(value)))
        .collect()
}

fn retain_any_substring<'a, F>(
    repos: Vec<&'a Repository>,
    selected: &[String],
    field: F,
) -> Vec<&'a Repository>
where
    F: Fn(&Repository) -> &String,
{
    if selected.is_empty() {
        return repos;
    }
    repos
        .into_iter()
        .filter(|repo| selected.iter().any(|value| field(repo).contains(value.as_str())))
        .collect()
}

#[cfg(test)]
mod filter_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(name: &str, organisation: &str) -> Repository {
        Repository {
            name: name.to_string(),
            url: format!("https://git.example.org/{organisation}/{name}"),
            organisation_name: organisation.to_string(),
            language: vec![],
            license: vec![],
            topics: vec![],
            kind: vec![],
            status: String::new(),
            vitality: 0.0,
            last_updated: 0,
            is_experimental: false,
        }
    }

    fn names(repos: &[&Repository]) -> Vec<String> {
        repos.iter().map(|r| r.name.clone()).collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_is_identity() {
        let items = [repo("a", "org"), repo("b", "org")];
        let all: Vec<&Repository> = items.iter().collect();

        assert_eq!(by_category(all.clone(), &[]).len(), 2);
        assert_eq!(by_language(all.clone(), &[]).len(), 2);
        assert_eq!(by_licence(all.clone(), &[]).len(), 2);
        assert_eq!(by_function(all.clone(), &[]).len(), 2);
        assert_eq!(by_dev_status(all.clone(), &[]).len(), 2);
        assert_eq!(by_organisation(all.clone(), &[]).len(), 2);
        assert_eq!(by_administration(all.clone(), &[], &[]).len(), 2);
        assert_eq!(by_dependency(all.clone(), &[], &[]).len(), 2);
        assert_eq!(by_vitality(all, None).len(), 2);
    }

    #[test]
    fn test_administration_resolves_through_organisations() {
        let items = [
            repo("tax-engine", "dgfip"),
            repo("health-data", "sante-gouv"),
            repo("etalab-tools", "etalab-ia"),
        ];
        let organisations = vec![
            Organisation {
                name: "dgfip".to_string(),
                administrations: strings(&["Ministère de l'Économie"]),
            },
            Organisation {
                name: "etalab".to_string(),
                administrations: strings(&["Premier ministre", "DINUM"]),
            },
            Organisation {
                name: "sante-gouv".to_string(),
                administrations: strings(&["Ministère de la Santé"]),
            },
        ];

        let result = by_administration(items.iter().collect(), &organisations, &strings(&["DINUM"]));
        // "etalab-ia" contains the resolved organisation name "etalab"
        assert_eq!(names(&result), vec!["etalab-tools"]);

        let result = by_administration(
            items.iter().collect(),
            &organisations,
            &strings(&["Ministère de l'Économie", "Ministère de la Santé"]),
        );
        assert_eq!(names(&result), vec!["tax-engine", "health-data"]);

        let result = by_administration(items.iter().collect(), &organisations, &strings(&["Unknown"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_dependency_joins_on_repository_url() {
        let items = [repo("api", "org"), repo("front", "org"), repo("docs", "org")];
        let dependencies = vec![
            Dependency {
                name: "serde".to_string(),
                repository_urls: vec![items[0].url.clone()],
            },
            Dependency {
                name: "react".to_string(),
                repository_urls: vec![items[1].url.clone(), "https://elsewhere.org/x".to_string()],
            },
        ];

        let result = by_dependency(items.iter().collect(), &dependencies, &strings(&["react"]));
        assert_eq!(names(&result), vec!["front"]);

        let result = by_dependency(items.iter().collect(), &dependencies, &strings(&["serde", "react"]));
        assert_eq!(names(&result), vec!["api", "front"]);

        let result = by_dependency(items.iter().collect(), &dependencies, &strings(&["left-pad"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_vitality_bounds_are_inclusive() {
        let mut items = vec![];
        for (name, vitality) in [("below", 39.0), ("min", 40.0), ("inside", 70.0), ("max", 90.0), ("above", 91.0)] {
            let mut r = repo(name, "org");
            r.vitality = vitality;
            items.push(r);
        }

        let result = by_vitality(items.iter().collect(), Some(VitalityRange::new(40.0, 90.0)));
        assert_eq!(names(&result), vec!["min", "inside", "max"]);
    }

    #[test]
    fn test_vitality_range_swaps_reversed_bounds() {
        let range = VitalityRange::new(80.0, 20.0);
        assert_eq!(range.min, 20.0);
        assert_eq!(range.max, 80.0);
        assert!(range.contains(50.0));
    }

    #[test]
    fn test_list_facets_match_any_selected_value() {
        let mut rust = repo("rust-lib", "org");
        rust.language = strings(&["Rust"]);
        rust.license = strings(&["MIT", "Apache-2.0"]);
        rust.topics = strings(&["cli"]);
        rust.kind = strings(&["Library"]);
        let mut python = repo("py-app", "org");
        python.language = strings(&["Python", "Shell"]);
        python.license = strings(&["EUPL-1.2"]);
        python.topics = strings(&["data"]);
        python.kind = strings(&["Source Code"]);
        let items = [rust, python];

        let result = by_language(items.iter().collect(), &strings(&["Shell", "Go"]));
        assert_eq!(names(&result), vec!["py-app"]);

        let result = by_licence(items.iter().collect(), &strings(&["Apache-2.0"]));
        assert_eq!(names(&result), vec!["rust-lib"]);

        let result = by_category(items.iter().collect(), &strings(&["cli", "data"]));
        assert_eq!(names(&result), vec!["rust-lib", "py-app"]);

        let result = by_function(items.iter().collect(), &strings(&["Algorithm"]));
        assert!(result.is_empty());

        // list membership is exact, not substring
        let result = by_language(items.iter().collect(), &strings(&["Rus"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_scalar_facets_match_on_substring() {
        let mut beta = repo("one", "DINUM-lab");
        beta.status = "Beta".to_string();
        let mut stable = repo("two", "dgfip");
        stable.status = "Stable".to_string();
        let items = [beta, stable];

        let result = by_dev_status(items.iter().collect(), &strings(&["Beta"]));
        assert_eq!(names(&result), vec!["one"]);

        let result = by_organisation(items.iter().collect(), &strings(&["DINUM"]));
        assert_eq!(names(&result), vec!["one"]);
    }

    #[test]
    fn test_hide_experimental() {
        let mut experimental = repo("lab", "org");
        experimental.is_experimental = true;
        let items = [repo("prod", "org"), experimental];

        assert_eq!(names(&hide_experimental(items.iter().collect())), vec!["prod"]);
    }

    #[test]
    fn test_filters_are_idempotent() {
        let mut a = repo("a", "org-a");
        a.language = strings(&["Rust"]);
        a.vitality = 50.0;
        let mut b = repo("b", "org-b");
        b.language = strings(&["Go"]);
        b.vitality = 10.0;
        let items = [a, b];
        let selected = strings(&["Rust"]);

        let once = by_language(items.iter().collect(), &selected);
        let twice = by_language(once.clone(), &selected);
        assert_eq!(names(&once), names(&twice));

        let range = Some(VitalityRange::new(20.0, 60.0));
        let once = by_vitality(items.iter().collect(), range);
        let twice = by_vitality(once.clone(), range);
        assert_eq!(names(&once), names(&twice));

        let once = by_organisation(items.iter().collect(), &strings(&["org-b"]));
        let twice = by_organisation(once.clone(), &strings(&["org-b"]));
        assert_eq!(names(&once), names(&twice));
    }
}
