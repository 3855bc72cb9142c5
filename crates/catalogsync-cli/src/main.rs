use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catalogsync_cli::{FileCatalog, Handler, RetryingCatalog};
use catalogsync_core::{SyncConfig, TableModel, TargetType};
use catalogsync_ddl::DdlRenderer;
use catalogsync_target::KeyPairIssuer;

/// catalogsync - Mirror catalog table definitions into warehouse external tables
#[derive(Parser)]
#[command(name = "catalogsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the connection document (.json or .toml)
    #[arg(short, long, global = true, env = "SYNC_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Sync target: SNOWFLAKE or LOGGING (required by `handle`)
    #[arg(short, long, global = true, env = "TARGET_TYPE")]
    target_type: Option<TargetType>,

    /// Directory of exported table descriptions (<database>/<table>.json)
    #[arg(long, global = true, env = "CATALOG_DIR", default_value = "catalog")]
    catalog_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Handle one catalog change event
    Handle {
        /// Event JSON file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },

    /// Render the DDL batch for a table description without applying it
    Render {
        /// GetTable response JSON file
        table: PathBuf,
    },

    /// Load and validate the connection document
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Some(
            SyncConfig::from_file(path)
                .with_context(|| format!("Failed to load connection document {}", path.display()))?,
        ),
        None => {
            if cli.verbose {
                eprintln!("{}", "No connection document given".yellow());
            }
            None
        }
    };

    match cli.command {
        Commands::Handle { event } => {
            let target_type = cli
                .target_type
                .context("handle needs a target type (--target-type or TARGET_TYPE)")?;
            handle_command(target_type, config.as_ref(), &cli.catalog_dir, &event, cli.verbose).await
        }
        Commands::Render { table } => render_command(config.as_ref(), &table, cli.verbose),
        Commands::CheckConfig => check_config_command(config.as_ref()),
    }
}

/// Handle command - run one event through the handler
async fn handle_command(
    target_type: TargetType,
    config: Option<&SyncConfig>,
    catalog_dir: &Path,
    event_source: &str,
    verbose: bool,
) -> Result<()> {
    let event = read_event(event_source)?;

    let catalog = RetryingCatalog::new(FileCatalog::new(catalog_dir));
    let handler = Handler::initialize(target_type, config, catalog)?;

    if verbose {
        eprintln!("{} {}", "Target:".cyan(), handler.target_name());
        eprintln!("{} {}", "Catalog:".cyan(), catalog_dir.display());
    }

    let invocation = handler.handle_json(&event).await?;

    if verbose {
        eprintln!("{} {:?}", "Result:".green(), invocation);
    }

    println!("{}", serde_json::to_string(&invocation.response())?);
    Ok(())
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut event = String::new();
        std::io::stdin()
            .read_to_string(&mut event)
            .context("Failed to read event from stdin")?;
        Ok(event)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read event {}", source))
    }
}

/// Render command - print the DDL batch for one table description
fn render_command(config: Option<&SyncConfig>, table_path: &Path, verbose: bool) -> Result<()> {
    let config = config.context("render needs a connection document (--config)")?;

    let document = std::fs::read_to_string(table_path)
        .with_context(|| format!("Failed to read table description {}", table_path.display()))?;
    let tables = TableModel::from_get_table_str(&document)?;

    if tables.is_empty() {
        eprintln!("{}", "Table has no storage descriptor; nothing to render".yellow());
        return Ok(());
    }

    let renderer = DdlRenderer::new()?;
    let batch = renderer.render_batch(&tables, config.stage_map(), config.allowed_formats())?;

    for skipped in batch.skipped() {
        eprintln!("{} {}: {}", "Skipped".yellow(), skipped.table, skipped.reason);
    }

    if batch.is_empty() {
        eprintln!("{}", "No statements rendered".yellow());
        return Ok(());
    }

    if verbose {
        eprintln!(
            "{} {} statement(s) for {}",
            "Rendered".green(),
            batch.statement_count(),
            batch.tables().join(", ")
        );
    }

    println!("{}", batch.statement());
    Ok(())
}

/// Check-config command - validate the connection document
fn check_config_command(config: Option<&SyncConfig>) -> Result<()> {
    let config = config.context("check-config needs a connection document (--config)")?;

    eprintln!("{} {}", "Endpoint:".cyan(), config.url);
    eprintln!("{} {}", "Account:".cyan(), config.account_identifier);
    eprintln!("{} {}", "User:".cyan(), config.username);
    eprintln!("{} {}", "Role:".cyan(), config.role);
    eprintln!("{} {}", "Warehouse:".cyan(), config.warehouse);

    let issuer = KeyPairIssuer::from_config(config).context("Private key is not usable")?;
    eprintln!("{} {}", "Key fingerprint:".cyan(), issuer.fingerprint());

    eprintln!("{} {}", "Stages:".cyan(), config.stage_map().len());
    for (stage, path) in config.stage_map().iter() {
        eprintln!("  {} -> {}", stage, path);
    }

    let formats: Vec<&str> = config.allowed_formats().iter().collect();
    eprintln!("{} {}", "File formats:".cyan(), formats.join(", "));

    eprintln!("{}", "Connection document is valid".green());
    Ok(())
}
