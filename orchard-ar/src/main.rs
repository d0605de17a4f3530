//! orchard-ar (Analysis & Reports) service
//!
//! Stores orchard disease observations and serves aggregate findings,
//! per-record and aggregate report documents, and CSV exports.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use orchard_common::config::{
    ensure_directory_exists, resolve_root_folder, TomlConfig, CONFIG_FILE_NAME,
};
use orchard_common::db::init_database;
use orchard_ar::{build_router, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "orchard-ar", version, about = "Orchard analysis and report service")]
struct Args {
    /// Path to orchard.toml (default: <root folder>/orchard.toml)
    #[arg(long, env = "ORCHARD_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database and config
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long, env = "ORCHARD_PORT")]
    port: Option<u16>,

    /// SQLite database file (overrides the config file)
    #[arg(long, env = "ORCHARD_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config comes first so its log level can seed the subscriber
    let config_path = args.config.clone().unwrap_or_else(|| {
        resolve_root_folder(args.root_folder.as_deref(), None).join(CONFIG_FILE_NAME)
    });
    let config_found = config_path.exists();
    let config = TomlConfig::load_or_default(&config_path).await?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting orchard-ar v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!("Config file: {}", config_path.display());
    } else {
        warn!(
            "Config file {} not found, using built-in defaults",
            config_path.display()
        );
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), config.root_folder.as_deref());
    ensure_directory_exists(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database_path_in(&root_folder));
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    let analysis = config
        .analysis_config()
        .context("Invalid [analysis] configuration")?;
    info!(
        "Catalog categories: {} (unknown categories: {:?})",
        analysis.catalog.categories().join(", "),
        analysis.unknown_categories
    );
    if config.auth.enabled {
        info!("Session login required for API access");
    } else {
        info!("API authentication disabled");
    }

    let state = AppState::new(pool, analysis, config.report, config.auth.clone());
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", config.bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("orchard-ar listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
