//! Screening engine host binary
//!
//! Runs the engine against a local SQLite database and a sources/
//! directory, recovering any interrupted work on startup. The surrounding
//! API process embeds the engine the same way.

use std::sync::Arc;

use namescreen::providers::{LocalSourceStore, LogTransport};
use namescreen::{Collaborators, EngineConfig, ScreeningDb, ScreeningEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namescreen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    std::fs::create_dir_all("sources")?;
    let db = Arc::new(ScreeningDb::new("namescreen.db")?);
    let sources = Arc::new(LocalSourceStore::new("sources"));

    let engine = ScreeningEngine::start(
        config,
        Collaborators {
            sources,
            datasets: db.clone(),
            tasks: db.clone(),
            searches: db.clone(),
            notifications: db.clone(),
            transport: Arc::new(LogTransport),
        },
    )?;

    let report = engine.recover().await?;
    tracing::info!(
        tasks = report.tasks,
        searches = report.searches,
        notifications = report.notifications,
        "startup recovery finished"
    );

    tracing::info!("engine running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    engine.shutdown().await;
    Ok(())
}
