//! TraceDB server binary
//!
//! Loads `tracedb.toml` (writing a default one on first start), applies
//! command-line overrides, opens the store and serves the HTTP API.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracedb_engine::{TraceDatabase, TraceDbConfig, CONFIG_FILE_NAME};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Request trace collector and viewer API
#[derive(Debug, Parser)]
#[command(name = "tracedb", version, about)]
struct Cli {
    /// Config file; created with defaults if missing
    #[arg(long, env = "TRACEDB_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Listen address, overrides `bind`
    #[arg(long, env = "TRACEDB_BIND")]
    bind: Option<String>,

    /// Batch log directory, overrides `data_dir`
    #[arg(long, env = "TRACEDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// cache | standard | always, overrides `durability`
    #[arg(long, env = "TRACEDB_DURABILITY")]
    durability: Option<String>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<TraceDbConfig> {
        TraceDbConfig::write_default_if_missing(&self.config)?;
        let mut config = TraceDbConfig::from_file(&self.config)?;

        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(durability) = &self.durability {
            config.durability = durability.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tracedb=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli
        .load_config()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let bind = config.bind.clone();
    let db = tokio::task::spawn_blocking(move || TraceDatabase::open(config))
        .await?
        .context("opening trace store")?;
    let events = db.len()?;
    info!(events, durability = %db.config().durability, "Trace store ready");

    let app = tracedb_server::router(db);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("TraceDB listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
