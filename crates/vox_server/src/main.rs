//! # vox_server — authoritative game server
//!
//! Owns the canonical world, advances it at a fixed tick rate, and
//! replicates dispatched actions to every connected peer.
//!
//! ## Startup sequence
//!
//! 1. Parse CLI arguments and load settings (JSON file, CLI overrides).
//! 2. Bind the TCP listener.
//! 3. Spawn the accept loop and run the world task.

mod peers;
mod replication;
mod settings;
mod transport;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use replication::GameServer;
use settings::Settings;

#[derive(Parser)]
#[command(name = "vox_server", about = "Authoritative voxel-shooter game server")]
struct Args {
    /// Path to a JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address override
    #[arg(short, long)]
    bind: Option<String>,

    /// Tick rate override, in Hz
    #[arg(short, long)]
    tick_rate: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading settings");
            Settings::load(path)?
        }
        None => Settings::default(),
    };
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if let Some(rate) = args.tick_rate {
        settings.tick_rate_hz = rate;
    }

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, tick_rate = settings.tick_rate_hz, "server starting");

    let server = GameServer::new(settings.clone());
    let commands = server.command_sender();
    tokio::spawn(transport::run_listener(listener, commands, settings));

    server.run().await;
    Ok(())
}
