//! codegouv - browse the code.gouv.fr catalog of public-sector repositories
//!
//! Loads the catalog once from a snapshot file or the remote API, applies
//! the requested selection and prints the result.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod catalog_cli;

use catalog_cli::CatalogCommand;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "codegouv",
    about = "Browse, filter and search the code.gouv.fr repository catalog",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: CatalogCommand,

    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[clap(long, global = true)]
    log_json: bool,

    /// Load the catalog from this snapshot file (YAML or JSON)
    #[clap(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

fn initialize_tracing(log_level: &LogLevel, json: bool) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    // logs go to stderr so stdout stays parseable with --json
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    let source = catalog_cli::SourceOptions {
        snapshot: cli.snapshot,
        config: cli.config,
    };
    cli.command.execute(source).await
}
