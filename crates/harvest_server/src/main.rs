//! Harvest server: periodic harvesting plus a small read API.
mod api;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use harvest_engine::{
    run_periodic, Harvester, JsonFileBackend, ReqwestFetcher, Schedule, SqliteBackend, Store,
    StoreBackend,
};
use harvest_logging::{harvest_error, harvest_info, LogDestination};
use log::LevelFilter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::ApiState;
use crate::settings::{Settings, StoreLocation};

#[derive(Parser, Debug)]
#[command(
    name = "harvest_server",
    about = "Harvests paginated article listings and serves the latest articles over HTTP"
)]
struct Cli {
    /// RON settings file.
    #[arg(long, env = "HARVEST_CONFIG", default_value = "harvester.ron")]
    config: PathBuf,

    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let destination = match cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    harvest_logging::initialize(destination, level);

    let settings = Settings::load(&cli.config)?;
    let mut store = Store::open(open_backend(&settings.store).await?)
        .await
        .context("failed to load stored articles")?;
    let read_model = store.read_model();

    let fetcher = Arc::new(ReqwestFetcher::new(settings.fetch.to_fetch_settings()));
    let harvester = Arc::new(Harvester::new(settings.harvest.clone(), fetcher)?);
    let shutdown = CancellationToken::new();

    let scheduler = {
        let harvester = Arc::clone(&harvester);
        let shutdown = shutdown.clone();
        let schedule = Schedule::every_hours(settings.reparse_hours, settings.run_at_startup);
        tokio::spawn(async move {
            run_periodic(&harvester, &mut store, schedule, shutdown).await;
            store
        })
    };

    let state = ApiState::new(read_model, harvester.subscribe(), settings.default_count);
    let listener = TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    harvest_info!("Listening on {}", settings.bind);

    let signal = shutdown.clone();
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                harvest_error!("Failed to listen for ctrl-c: {}", err);
            }
            harvest_info!("Shutdown requested");
            signal.cancel();
        })
        .await
        .context("http server failed")?;

    shutdown.cancel();
    let mut store = scheduler.await.context("scheduler task failed")?;
    let saved = store.commit().await.context("shutdown save failed")?;
    harvest_info!("Saved {} articles on shutdown", saved);
    Ok(())
}

async fn open_backend(location: &StoreLocation) -> Result<Box<dyn StoreBackend>> {
    Ok(match location {
        StoreLocation::JsonFile(path) => Box::new(JsonFileBackend::new(path.clone())),
        StoreLocation::Sqlite(url) => Box::new(
            SqliteBackend::connect(url)
                .await
                .with_context(|| format!("failed to open {url}"))?,
        ),
    })
}
