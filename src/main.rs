//! Binary entrypoint: a `clap`-derived CLI wrapping the server bootstrap and
//! the `cleanup-stale-games` admin command, matching the teacher's
//! `main.rs` shape and the original's
//! `management/commands/cleanup_stale_games.py`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use dicewars_room_engine::config::EngineConfig;
use dicewars_room_engine::handlers::Engine;
use dicewars_room_engine::hub::Hub;
use dicewars_room_engine::store::MemoryRoomStore;
use dicewars_room_engine::websocket::{create_router, AppState};
use dicewars_room_engine::{janitor, logging};

#[derive(Parser)]
#[command(name = "dicewars-room-engine", about = "DiceWars room engine server")]
struct Cli {
    /// Path to a JSON config file; falls back to defaults and environment
    /// variables when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the WebSocket server (default if no subcommand is given).
    Serve,
    /// Delete stale `waiting` rooms once and exit.
    CleanupStaleGames,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.logging);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CleanupStaleGames => cleanup_stale_games(config).await,
    }
}

async fn serve(config: EngineConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryRoomStore::new());
    let hub = Arc::new(Hub::new());
    let engine = Arc::new(Engine::new(store.clone(), hub.clone(), config.orchestrator));

    let cleanup_interval = std::time::Duration::from_secs(config.server.room_cleanup_interval_secs);
    let max_age = chrono::Duration::seconds(config.server.stale_room_max_age_secs);
    tokio::spawn(janitor::run(store, hub, cleanup_interval, max_age));

    let state = AppState {
        engine: engine.clone(),
        security: Arc::new(config.security.clone()),
    };
    let app = create_router(state, &config.security.cors_origins);

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    info!(%addr, "starting dicewars room engine");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn cleanup_stale_games(config: EngineConfig) -> anyhow::Result<()> {
    let store = MemoryRoomStore::new();
    let max_age = chrono::Duration::seconds(config.server.stale_room_max_age_secs);
    let removed = janitor::sweep_once(&store, max_age).await?;
    info!(rooms_removed = removed, "cleanup-stale-games finished");
    Ok(())
}
