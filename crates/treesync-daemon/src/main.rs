//! Treesync Daemon - Background directory synchronization service
//!
//! This binary wires the pieces together and handles:
//! - Watching the local target directory and pushing changes to the peer
//! - Receiving pushed changes from the peer over HTTP
//! - The operator control plane (config form, start/refresh)
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon loads the configuration, starts the watch engine and the
//! HTTP server as separate tasks, then waits for a shutdown signal. A
//! `CancellationToken` triggered on SIGTERM or SIGINT stops both tasks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use treesync_core::Config;
use treesync_server::{ServerState, SyncServer};
use treesync_watch::{WatchEngine, CONTROL_CHANNEL_CAPACITY};

/// Two-way directory synchronization daemon.
#[derive(Parser, Debug)]
#[command(name = "treesyncd", version, about)]
struct Args {
    /// Path to the configuration file (defaults to ./config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    info!("Treesync daemon starting (treesyncd)");

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);
    info!(config_path = %config_path.display(), "Loaded configuration");

    for error in config.validate() {
        warn!(field = %error.field, message = %error.message, "Config warning");
    }

    // The watch engine needs the directory to exist before it can register
    // the root watch.
    if tokio::fs::metadata(&config.sync.target_dir).await.is_err() {
        info!(
            dir = %config.sync.target_dir.display(),
            "Target directory missing, creating it"
        );
        tokio::fs::create_dir_all(&config.sync.target_dir)
            .await
            .context("Failed to create target directory")?;
    }

    let listen = config.server.listen;
    let config = Arc::new(RwLock::new(config));

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);

    let (engine, watch_set) = WatchEngine::new(Arc::clone(&config), control_rx)
        .await
        .context("Failed to initialize watch engine")?;

    let engine_token = shutdown_token.clone();
    let engine_task = tokio::spawn(async move {
        engine.run(engine_token).await;
    });

    let state = ServerState {
        config,
        config_path,
        watch_set,
        control_tx,
    };
    let server = SyncServer::new(state, listen);
    let server_token = shutdown_token.clone();
    let server_task = tokio::spawn(async move { server.run(server_token).await });

    let result = match server_task.await {
        Ok(result) => result.context("Sync server failed"),
        Err(e) => Err(e).context("Sync server task panicked"),
    };

    // The server only returns once the token is cancelled or on a bind
    // error; make sure the engine stops in both cases.
    shutdown_token.cancel();
    if let Err(e) = engine_task.await {
        error!(error = %e, "Watch engine task panicked");
    }

    match &result {
        Ok(()) => info!("Treesync daemon shut down gracefully"),
        Err(e) => error!(error = %format!("{e:#}"), "Treesync daemon exiting with error"),
    }

    result
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_config_path() {
        let args = Args::parse_from(["treesyncd"]);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_explicit_config_path() {
        let args = Args::parse_from(["treesyncd", "--config", "/etc/treesync.json"]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/treesync.json")));
    }

    #[test]
    fn test_cancellation_token_child_propagation() {
        let parent = CancellationToken::new();
        let child1 = parent.child_token();
        let child2 = parent.child_token();

        parent.cancel();

        assert!(child1.is_cancelled());
        assert!(child2.is_cancelled());
    }
}
