//! Catalog CLI commands
//!
//! Every command loads the catalog once, then reads derived outputs from
//! the `Catalog` facade.

use anyhow::{bail, Context, Result};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Args, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, info};

use codegouv_core::api::{CatalogApi, SnapshotApi};
use codegouv_core::catalog::{Catalog, FilterUpdate, Repository, Sort, StageReport, VitalityRange};
use codegouv_core::config::CodegouvConfig;

/// Where the catalog comes from, as given on the command line
#[derive(Debug, Default)]
pub struct SourceOptions {
    pub snapshot: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Filter, search and sort the repositories
    Search(SearchArgs),

    /// List the values accepted by one facet
    Options {
        #[clap(value_enum)]
        facet: Facet,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show the upstream repository statistics
    Stats {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Fuzzy query matched against repository names
    pub query: Option<String>,

    #[clap(long = "administration")]
    pub administrations: Vec<String>,

    #[clap(long = "category")]
    pub categories: Vec<String>,

    #[clap(long = "dependency")]
    pub dependencies: Vec<String>,

    /// Repository kind ("Library", "Algorithm", "Source Code")
    #[clap(long = "function")]
    pub functions: Vec<String>,

    #[clap(long = "language")]
    pub languages: Vec<String>,

    #[clap(long = "licence")]
    pub licences: Vec<String>,

    /// Development status (substring match)
    #[clap(long = "status")]
    pub statuses: Vec<String>,

    /// Organisation (substring match)
    #[clap(long = "organisation")]
    pub organisations: Vec<String>,

    /// Inclusive vitality range, e.g. 40..100
    #[clap(long, value_parser = parse_vitality)]
    pub vitality: Option<VitalityRange>,

    #[clap(long)]
    pub hide_experimental: bool,

    #[clap(
        long,
        default_value = "name_asc",
        value_parser = PossibleValuesParser::new(Sort::OPTIONS.map(|sort| sort.as_str()))
            .map(|value| Sort::from_str_lossy(&value))
    )]
    pub sort: Sort,

    /// Show at most this many repositories
    #[clap(long)]
    pub limit: Option<usize>,

    /// Output results as JSON
    #[clap(long)]
    pub json: bool,

    /// Report how many repositories each pipeline stage kept
    #[clap(long)]
    pub explain: bool,
}

impl SearchArgs {
    /// One selection update per facet flag
    fn updates(&self) -> Vec<FilterUpdate> {
        let mut updates = vec![
            FilterUpdate::Administrations(self.administrations.clone()),
            FilterUpdate::Categories(self.categories.clone()),
            FilterUpdate::Dependencies(self.dependencies.clone()),
            FilterUpdate::Functions(self.functions.clone()),
            FilterUpdate::Languages(self.languages.clone()),
            FilterUpdate::Licences(self.licences.clone()),
            FilterUpdate::DevStatus(self.statuses.clone()),
            FilterUpdate::Organisations(self.organisations.clone()),
            FilterUpdate::Vitality(self.vitality),
            FilterUpdate::ExperimentalReposHidden(self.hide_experimental),
            FilterUpdate::Sort(self.sort),
        ];
        if let Some(query) = &self.query {
            updates.push(FilterUpdate::Search(query.clone()));
        }
        updates
    }
}

/// Facets with an option list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Facet {
    Administrations,
    Categories,
    Dependencies,
    Functions,
    Languages,
    Licences,
    DevStatus,
    /// Status labels found in the loaded repositories
    PresentDevStatus,
    Organisations,
    Sort,
}

fn parse_vitality(value: &str) -> std::result::Result<VitalityRange, String> {
    let (min, max) = value
        .split_once("..")
        .ok_or_else(|| format!("Invalid vitality range: {value} (expected MIN..MAX)"))?;

    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| format!("Invalid vitality minimum: {min}"))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| format!("Invalid vitality maximum: {max}"))?;
    if !min.is_finite() || !max.is_finite() {
        return Err(format!("Vitality bounds must be finite numbers: {value}"));
    }

    Ok(VitalityRange::new(min, max))
}

impl CatalogCommand {
    pub async fn execute(self, source: SourceOptions) -> Result<()> {
        let mut catalog = load_catalog(&source).await?;

        match self {
            CatalogCommand::Search(args) => execute_search(&mut catalog, &args),
            CatalogCommand::Options { facet, json } => execute_options(&mut catalog, facet, json),
            CatalogCommand::Stats { json } => execute_stats(&catalog, json),
        }
    }
}

async fn load_catalog(source: &SourceOptions) -> Result<Catalog> {
    let config = match &source.config {
        Some(path) => CodegouvConfig::load_from_path(path),
        None => CodegouvConfig::load(),
    }
    .context("Failed to load configuration")?;

    let api = open_api(source.snapshot.as_deref(), &config)?;

    let mut catalog = Catalog::with_search_cache_capacity(config.search_cache_capacity());
    catalog
        .initialize_from(api.as_ref())
        .await
        .with_context(|| format!("Failed to load the catalog from {}", api.name()))?;

    info!(
        "Catalog ready with {} repositories",
        catalog.repository_count()?
    );
    Ok(catalog)
}

/// Snapshot flag, then configured snapshot, then the remote API
fn open_api(snapshot: Option<&Path>, config: &CodegouvConfig) -> Result<Box<dyn CatalogApi>> {
    if let Some(path) = snapshot.or(config.source.snapshot.as_deref()) {
        debug!("Using snapshot {}", path.display());
        let api = SnapshotApi::open(path)
            .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
        return Ok(Box::new(api));
    }

    if let Some(url) = &config.source.api_url {
        return open_remote(url, config.source.timeout_seconds);
    }

    bail!("No catalog source: pass --snapshot, or set source.snapshot or source.api_url in the configuration")
}

#[cfg(feature = "remote")]
fn open_remote(url: &str, timeout_seconds: u64) -> Result<Box<dyn CatalogApi>> {
    debug!("Using remote catalog API at {}", url);
    let api = codegouv_core::api::HttpApi::new(url, timeout_seconds)?;
    Ok(Box::new(api))
}

#[cfg(not(feature = "remote"))]
fn open_remote(url: &str, _timeout_seconds: u64) -> Result<Box<dyn CatalogApi>> {
    Err(anyhow::anyhow!(
        "Remote catalog API ({url}) requires the 'remote' feature; use --snapshot instead"
    ))
}

/// Table row for search results
#[derive(Tabled)]
struct RepositoryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Organisation")]
    organisation: String,
    #[tabled(rename = "Languages")]
    languages: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Vitality")]
    vitality: String,
    #[tabled(rename = "Last update")]
    last_update: String,
}

impl From<&Repository> for RepositoryRow {
    fn from(repository: &Repository) -> Self {
        let languages = repository.language.join(", ");
        Self {
            name: repository.name.clone(),
            organisation: repository.organisation_name.clone(),
            languages: if languages.chars().count() > 30 {
                format!("{}...", languages.chars().take(27).collect::<String>())
            } else {
                languages
            },
            status: repository.status.clone(),
            vitality: format!("{:.0}", repository.vitality),
            last_update: format_timestamp(repository.last_updated),
        }
    }
}

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Remaining")]
    remaining: usize,
}

impl From<&StageReport> for StageRow {
    fn from(report: &StageReport) -> Self {
        Self {
            stage: report.stage.to_string(),
            active: if report.triggered { "yes" } else { "-" }.to_string(),
            remaining: report.remaining,
        }
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

fn execute_search(catalog: &mut Catalog, args: &SearchArgs) -> Result<()> {
    for update in args.updates() {
        catalog.update_filter(update)?;
    }

    let repositories = catalog.filtered_repositories()?;
    let total = repositories.len();
    let shown = &repositories[..args.limit.unwrap_or(total).min(total)];
    let reports = if args.explain {
        Some(catalog.explain()?)
    } else {
        None
    };

    if args.json {
        let mut output = serde_json::json!({
            "total": total,
            "repositories": shown,
        });
        if let Some(reports) = &reports {
            output["stages"] = reports
                .iter()
                .map(|report| {
                    serde_json::json!({
                        "stage": report.stage.as_str(),
                        "triggered": report.triggered,
                        "remaining": report.remaining,
                    })
                })
                .collect();
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(reports) = &reports {
        let rows: Vec<StageRow> = reports.iter().map(StageRow::from).collect();
        println!("{}\n", render(&rows));
    }

    if shown.is_empty() {
        println!("No repositories found.");
        return Ok(());
    }

    let rows: Vec<RepositoryRow> = shown.iter().map(RepositoryRow::from).collect();
    println!("{}", render(&rows));
    if shown.len() < total {
        println!("Showing {} of {} repositories.", shown.len(), total);
    } else {
        println!("Found {total} repositories.");
    }

    Ok(())
}

fn facet_options(catalog: &mut Catalog, facet: Facet) -> Result<Vec<String>> {
    let options = match facet {
        Facet::Administrations => catalog.administration_options()?.to_vec(),
        Facet::Categories => catalog.category_options()?.to_vec(),
        Facet::Dependencies => catalog.dependency_options()?,
        Facet::Functions => catalog.function_options()?.to_vec(),
        Facet::Languages => catalog.language_options()?.to_vec(),
        Facet::Licences => catalog.licence_options()?.to_vec(),
        Facet::DevStatus => catalog
            .dev_status_options()
            .iter()
            .map(|status| status.to_string())
            .collect(),
        Facet::PresentDevStatus => catalog.present_dev_statuses()?,
        Facet::Organisations => catalog.organisation_options()?.to_vec(),
        Facet::Sort => catalog
            .sort_options()
            .iter()
            .map(|sort| sort.to_string())
            .collect(),
    };
    Ok(options)
}

fn execute_options(catalog: &mut Catalog, facet: Facet, json_output: bool) -> Result<()> {
    let options = facet_options(catalog, facet)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        for option in &options {
            println!("{option}");
        }
    }
    Ok(())
}

fn execute_stats(catalog: &Catalog, json_output: bool) -> Result<()> {
    let statistics = catalog.repository_statistics()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(statistics)?);
        return Ok(());
    }

    println!("Repositories loaded: {}", catalog.repository_count()?);
    match statistics.0.as_object() {
        Some(fields) if !fields.is_empty() => {
            for (key, value) in fields {
                println!("  {key}: {value}");
            }
        }
        _ => println!("  (no upstream statistics)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use codegouv_core::catalog::{CatalogPayload, DevStatus};
    use pretty_assertions::assert_eq;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[clap(subcommand)]
        command: CatalogCommand,
    }

    fn parse(args: &[&str]) -> CatalogCommand {
        let mut argv = vec!["codegouv"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_parse_vitality_range() {
        let range = parse_vitality("40..100").unwrap();
        assert_eq!(range, VitalityRange::new(40.0, 100.0));
        assert!(range.contains(40.0));
        assert!(!range.contains(101.0));

        assert!(parse_vitality("40").is_err());
        assert!(parse_vitality("a..b").is_err());
    }

    #[test]
    fn test_non_finite_vitality_bounds_are_rejected() {
        for value in ["NaN..5", "0..NaN", "0..inf", "-inf..100", "infinity..infinity"] {
            let err = parse_vitality(value).unwrap_err();
            assert!(err.contains("finite"), "{value}: {err}");
        }
        assert!(TestCli::try_parse_from(["codegouv", "search", "--vitality", "NaN..5"]).is_err());
        assert_eq!(
            parse_vitality("-5..1e2").unwrap(),
            VitalityRange::new(-5.0, 100.0)
        );
    }

    #[test]
    fn test_search_flags_become_updates() {
        let CatalogCommand::Search(args) = parse(&[
            "search",
            "sill",
            "--language",
            "Rust",
            "--language",
            "Go",
            "--vitality",
            "10..20",
            "--sort",
            "last_update_asc",
            "--hide-experimental",
        ]) else {
            panic!("expected search");
        };

        let updates = args.updates();
        assert!(updates.contains(&FilterUpdate::Languages(vec![
            "Rust".to_string(),
            "Go".to_string()
        ])));
        assert!(updates.contains(&FilterUpdate::Search("sill".to_string())));
        assert!(updates.contains(&FilterUpdate::Sort(Sort::LastUpdateAsc)));
        assert!(updates.contains(&FilterUpdate::ExperimentalReposHidden(true)));
        assert!(updates.contains(&FilterUpdate::Vitality(Some(VitalityRange::new(
            10.0, 20.0
        )))));
    }

    #[test]
    fn test_unknown_sort_is_rejected() {
        assert!(TestCli::try_parse_from(["codegouv", "search", "--sort", "stars"]).is_err());
    }

    #[test]
    fn test_facet_options() {
        let mut catalog = Catalog::new();
        catalog.initialize(CatalogPayload {
            languages: vec!["Rust".to_string()],
            ..Default::default()
        });

        assert_eq!(
            facet_options(&mut catalog, Facet::Languages).unwrap(),
            vec!["Rust"]
        );
        assert_eq!(
            facet_options(&mut catalog, Facet::DevStatus).unwrap()[0],
            DevStatus::Beta.to_string()
        );
        assert_eq!(
            facet_options(&mut catalog, Facet::Sort).unwrap(),
            vec!["name_asc", "name_desc", "last_update_asc", "last_update_desc"]
        );
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_717_200_000_000), "2024-06-01");
    }

    #[test]
    fn test_missing_source_is_reported() {
        let config = CodegouvConfig::default();
        let err = open_api(None, &config).err().unwrap();
        assert!(err.to_string().contains("No catalog source"));
    }
}
