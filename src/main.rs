use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use observatory_import::config::Config;
use observatory_import::constants;
use observatory_import::db::SqliteStorage;
use observatory_import::error::ImportError;
use observatory_import::logging;
use observatory_import::queries;
use observatory_import::storage::Storage;
use observatory_import::types::RawGrid;
use observatory_import::Importer;

#[derive(Parser)]
#[command(name = "observatory-import")]
#[command(about = "Imports social media activity spreadsheets into per-account histories")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to $OBSERVATORY_CONFIG or observatory.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite document store (defaults to $OBSERVATORY_DB or observatory.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a platform's collection from a spreadsheet export
    Import {
        /// Platform to import. Available: facebook, instagram, twitter, youtube
        #[arg(long)]
        platform: String,
        /// JSON export of the spreadsheet: {"tabs": [{"name": .., "rows": [[..]]}]}
        #[arg(long)]
        grid: PathBuf,
    },
    /// List the stored accounts of a platform
    Accounts {
        #[arg(long)]
        platform: String,
    },
    /// Latest known value of every metric for an account
    Latest {
        #[arg(long)]
        platform: String,
        username: String,
    },
    /// Time series of one metric for an account
    Series {
        #[arg(long)]
        platform: String,
        username: String,
        metric: String,
    },
}

fn path_from_env(explicit: Option<PathBuf>, var: &str, default: &str) -> PathBuf {
    explicit
        .or_else(|| std::env::var(var).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn find_account(
    storage: &dyn Storage,
    collection: &str,
    username: &str,
) -> Result<observatory_import::types::PersistedAccount> {
    storage
        .find_account(collection, username)
        .await?
        .with_context(|| format!("There is no user [{username}] in {collection}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let config_path = path_from_env(cli.config, constants::CONFIG_PATH_ENV, constants::DEFAULT_CONFIG_PATH);
    let db_path = path_from_env(cli.db, constants::DB_PATH_ENV, constants::DEFAULT_DB_PATH);

    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&db_path)?);

    let platform = match &cli.command {
        Commands::Import { platform, .. }
        | Commands::Accounts { platform }
        | Commands::Latest { platform, .. }
        | Commands::Series { platform, .. } => platform.clone(),
    };
    let import_config = match config.import_config(&platform) {
        Ok(c) => c,
        Err(ImportError::UnknownPlatform(p)) => {
            warn!("Unknown platform {}", p);
            anyhow::bail!(
                "unknown platform '{}' (supported: {})",
                p,
                constants::get_supported_platforms().join(", ")
            );
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Commands::Import { grid, .. } => {
            let content = std::fs::read_to_string(&grid)
                .with_context(|| format!("reading grid {}", grid.display()))?;
            let raw = RawGrid::from_json_str(&content)?;

            let importer = Importer::new(storage);
            match importer.run(&raw, &import_config).await {
                Ok(report) => {
                    info!("Import of {} completed", platform);
                    print_json(&report)?;
                }
                Err(ImportError::Commit { attempted, failures }) => {
                    for failure in &failures {
                        error!("Account not saved: {}", failure);
                    }
                    anyhow::bail!("{} of {} accounts failed to save", failures.len(), attempted);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Accounts { .. } => {
            let accounts = storage.list_accounts(&import_config.collection).await?;
            let summary: Vec<_> = accounts
                .iter()
                .map(|a| serde_json::json!({ "name": a.name, "username": a.username, "link": a.link }))
                .collect();
            print_json(&summary)?;
        }
        Commands::Latest { username, .. } => {
            let account = find_account(storage.as_ref(), &import_config.collection, &username).await?;
            let latest = queries::latest(&account.history, import_config.metric_names());
            print_json(&latest)?;
        }
        Commands::Series { username, metric, .. } => {
            let account = find_account(storage.as_ref(), &import_config.collection, &username).await?;
            let points = queries::series(&account, &import_config, &metric)?;
            print_json(&points)?;
        }
    }

    Ok(())
}
