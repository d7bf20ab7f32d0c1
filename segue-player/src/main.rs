//! Segue player - main entry point
//!
//! Loop playback service: binds clips to a pair of playback channels,
//! crossfades across the loop boundary, and exposes an HTTP/SSE control
//! surface for the feed UI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segue_common::config::BootstrapConfig;
use segue_player::api::{self, AppContext};
use segue_player::audio::{DeviceUnit, MasterVolume};
use segue_player::engine::{ChannelPair, LoopCoordinator, PlaybackSession, VisibilityController};
use segue_player::{db, SharedState};

/// Command-line arguments for segue-player
#[derive(Parser, Debug)]
#[command(name = "segue-player")]
#[command(about = "Loop crossfade playback service")]
#[command(version)]
struct Args {
    /// Path to the bootstrap TOML config (platform config dir by default)
    #[arg(short, long, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "SEGUE_PORT")]
    port: Option<u16>,

    /// SQLite database path (overrides config)
    #[arg(short, long, env = "SEGUE_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Bootstrap config: explicit path, else platform config dir, else defaults
    let mut config = match &args.config {
        Some(path) => BootstrapConfig::load(path).context("Failed to load config file")?,
        None => BootstrapConfig::load_default().context("Failed to load config")?,
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting segue-player on port {}", config.port);
    info!("Database: {}", config.database_path.display());

    // Open settings database and load runtime settings
    let db_pool = db::connect(&config.database_path)
        .await
        .context("Failed to open settings database")?;

    let params = db::settings::load_engine_params(&db_pool)
        .await
        .context("Failed to load engine parameters")?;
    // Configuration invariants are startup failures, never runtime checks
    params.validate().context("Invalid engine parameters")?;

    let volume = db::settings::get_volume(&db_pool)
        .await
        .context("Failed to load volume")?;
    let device_name = db::settings::get_audio_device(&db_pool)
        .await
        .context("Failed to load audio device")?;

    // Build the engine: two fixed channels sharing the master volume
    let master_volume = Arc::new(MasterVolume::new(volume));
    let pair = Arc::new(ChannelPair::new(
        Arc::new(DeviceUnit::new(
            device_name.clone(),
            Arc::clone(&master_volume),
        )),
        Arc::new(DeviceUnit::new(device_name, Arc::clone(&master_volume))),
    ));

    let state = Arc::new(SharedState::new());
    state.set_volume(volume).await;

    let coordinator = LoopCoordinator::new(pair, params, Arc::clone(&state))
        .context("Failed to create loop coordinator")?;
    coordinator.spawn_progress_loop();

    let session = PlaybackSession::new(Arc::clone(&coordinator), Arc::clone(&state));
    let visibility = Arc::new(VisibilityController::new(
        Arc::clone(&session),
        params.visibility_threshold,
    ));

    info!(
        "Engine ready: lead={:?}, fade={:?}",
        params.crossfade_lead, params.fade_duration
    );

    let ctx = AppContext {
        state,
        session,
        visibility,
        master_volume,
        db_pool,
    };

    // Serve until a shutdown signal arrives
    tokio::select! {
        result = api::run(config.port, ctx) => {
            result.context("Server error")?;
        }
        _ = shutdown_signal() => {
            coordinator.shutdown();
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
