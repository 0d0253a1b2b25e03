//! CLI for one-off location storage migrations
//!
//! Reads storage settings from the environment (see `Config::from_env`) and
//! prints one JSON response line on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pitbully_core::config::{Config, DatabaseKind, StorageBackend};
use pitbully_core::domains::locations::backends::sql::Dialect;
use pitbully_core::domains::locations::backends::{LoadReport, MigrationReport};
use pitbully_core::domains::locations::{LocationStore, SqlLocationStore, YamlLocationStore};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pitbully_migrate")]
#[command(about = "Location storage migration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold legacy sections of the location file into the per-player layout
    UpgradeFile {
        /// Defaults to PITBULLY_DATA_FILE
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Copy every record from the location file into the configured database
    FileToDb {
        /// Defaults to PITBULLY_DATA_FILE
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the table definitions for a database family
    Schema {
        #[arg(long)]
        dialect: DatabaseKind,
    },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize, Default)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    loaded: Option<LoadReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrated: Option<MigrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statements: Option<Vec<String>>,
}

fn output(resp: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pitbully_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::UpgradeFile { file } => cmd_upgrade_file(file).await,
        Commands::FileToDb { file } => cmd_file_to_db(file).await,
        Commands::Schema { dialect } => cmd_schema(dialect),
    }
}

fn data_file(config: &Config, file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(|| config.storage.data_file.clone())
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_upgrade_file(file: Option<PathBuf>) -> Result<()> {
    let config = Config::from_env()?;
    let path = data_file(&config, file);
    let store = YamlLocationStore::new(&path);

    let loaded = store
        .load_document()
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    store
        .save_all()
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output(&Response {
        success: true,
        message: Some(format!(
            "Upgraded {} ({} legacy sections folded in)",
            path.display(),
            loaded.legacy_sections
        )),
        loaded: Some(loaded),
        ..Response::default()
    })
}

async fn cmd_file_to_db(file: Option<PathBuf>) -> Result<()> {
    let config = Config::from_env()?;
    let StorageBackend::Database(kind) = config.storage.backend else {
        return output(&Response {
            success: false,
            message: Some("PITBULLY_STORAGE must name a database to copy into".to_string()),
            ..Response::default()
        });
    };

    let path = data_file(&config, file);
    let source = YamlLocationStore::new(&path);
    let loaded = source
        .load_document()
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let database = pitbully_core::config::DatabaseConfig {
        kind,
        ..config.storage.database.clone()
    };
    let target = SqlLocationStore::connect(&database)
        .await
        .context("Failed to connect to database")?;

    let migrated = target.migrate_from_file_storage(&source).await?;
    target.close().await?;

    output(&Response {
        success: migrated.failures == 0,
        message: Some(format!(
            "Copied {} records from {} into {}",
            migrated.copied(),
            path.display(),
            kind
        )),
        loaded: Some(loaded),
        migrated: Some(migrated),
        ..Response::default()
    })
}

fn cmd_schema(dialect: DatabaseKind) -> Result<()> {
    output(&Response {
        success: true,
        statements: Some(Dialect::new(dialect).schema()),
        ..Response::default()
    })
}
