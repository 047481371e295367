//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern.

#![allow(dead_code)]

use async_trait::async_trait;
use codegouv_core::api::CatalogApi;
use codegouv_core::catalog::{
    CatalogPayload, Dependency, Organisation, Repository, RepositoryStatistics,
};
use codegouv_core::error::{CatalogError, Result};
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Path of a file under tests/fixtures
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Builder for test repositories with neutral defaults
pub struct RepositoryBuilder {
    repository: Repository,
}

impl RepositoryBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            repository: Repository {
                name: name.to_string(),
                url: format!("https://git.example.gouv.fr/{name}"),
                organisation_name: String::new(),
                language: vec![],
                license: vec![],
                topics: vec![],
                kind: vec![],
                status: String::new(),
                vitality: 0.0,
                last_updated: 0,
                is_experimental: false,
            },
        }
    }

    pub fn organisation(mut self, organisation: &str) -> Self {
        self.repository.organisation_name = organisation.to_string();
        self
    }

    pub fn vitality(mut self, vitality: f64) -> Self {
        self.repository.vitality = vitality;
        self
    }

    pub fn experimental(mut self) -> Self {
        self.repository.is_experimental = true;
        self
    }

    pub fn languages(mut self, languages: &[&str]) -> Self {
        self.repository.language = strings(languages);
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.repository.status = status.to_string();
        self
    }

    pub fn last_updated(mut self, last_updated: i64) -> Self {
        self.repository.last_updated = last_updated;
        self
    }

    pub fn build(self) -> Repository {
        self.repository
    }
}

pub fn organisation(name: &str, administrations: &[&str]) -> Organisation {
    Organisation {
        name: name.to_string(),
        administrations: strings(administrations),
    }
}

pub fn dependency(name: &str, repository_urls: &[&str]) -> Dependency {
    Dependency {
        name: name.to_string(),
        repository_urls: strings(repository_urls),
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The three-repository catalog used by the end-to-end scenarios
pub fn alpha_beta_gamma() -> CatalogPayload {
    CatalogPayload {
        repositories: vec![
            RepositoryBuilder::new("Alpha")
                .organisation("OrgA")
                .vitality(10.0)
                .build(),
            RepositoryBuilder::new("Beta")
                .organisation("OrgB")
                .vitality(90.0)
                .experimental()
                .build(),
            RepositoryBuilder::new("Gamma")
                .organisation("OrgA")
                .vitality(50.0)
                .build(),
        ],
        organisations: vec![organisation("OrgA", &["DINUM"]), organisation("OrgB", &["MINARM"])],
        organisation_names: strings(&["OrgA", "OrgB"]),
        ..Default::default()
    }
}

/// Provider whose `fail_on` collection always errors
pub struct FailingApi {
    pub payload: CatalogPayload,
    pub fail_on: &'static str,
}

impl FailingApi {
    fn check(&self, resource: &'static str) -> Result<()> {
        if self.fail_on == resource {
            return Err(CatalogError::upstream(
                resource,
                anyhow::anyhow!("503 Service Unavailable"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FailingApi {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        self.check("repositories")?;
        Ok(self.payload.repositories.clone())
    }

    async fn fetch_repository_statistics(&self) -> Result<RepositoryStatistics> {
        self.check("repository statistics")?;
        Ok(self.payload.repository_statistics.clone())
    }

    async fn fetch_languages(&self) -> Result<Vec<String>> {
        self.check("languages")?;
        Ok(self.payload.languages.clone())
    }

    async fn fetch_licences(&self) -> Result<Vec<String>> {
        self.check("licences")?;
        Ok(self.payload.licences.clone())
    }

    async fn fetch_administrations(&self) -> Result<Vec<String>> {
        self.check("administrations")?;
        Ok(self.payload.administrations.clone())
    }

    async fn fetch_dependencies(&self) -> Result<Vec<Dependency>> {
        self.check("dependencies")?;
        Ok(self.payload.dependencies.clone())
    }

    async fn fetch_organisations(&self) -> Result<Vec<Organisation>> {
        self.check("organisations")?;
        Ok(self.payload.organisations.clone())
    }

    async fn fetch_organisation_names(&self) -> Result<Vec<String>> {
        self.check("organisation names")?;
        Ok(self.payload.organisation_names.clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        self.check("categories")?;
        Ok(self.payload.categories.clone())
    }
}
