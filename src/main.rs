//! Leaderboard Server
//!
//! Serves per-game leaderboards over WebSocket.
//! Results live in an append-only JSON-lines log when `LEADERBOARD_DATA_PATH`
//! is set, in memory otherwise.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leaderboard::{
    network::{LeaderboardServer, ServerConfig},
    Clock, FileStore, LeaderboardService, MemoryStore, ResultStore, SystemClock, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("loading server configuration")?;

    info!("Leaderboard Server v{}", VERSION);
    info!("Bind address: {}", config.bind_addr);
    info!("Ranking length: {} (max {})", config.top_n, config.max_top_n);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn ResultStore> = match &config.data_path {
        Some(path) => {
            let store = FileStore::open(path, clock.clone())
                .await
                .with_context(|| format!("opening result log {}", path.display()))?;
            info!("Loaded {} results from {}", store.len().await, path.display());
            Arc::new(store)
        }
        None => {
            info!("No data path configured, results are kept in memory");
            Arc::new(MemoryStore::new(clock.clone()))
        }
    };

    let service = Arc::new(LeaderboardService::new(store, clock));
    let server = LeaderboardServer::new(config, service);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
        }
    }

    server.shutdown();
    server.drain(Duration::from_secs(2)).await;
    info!("Server stopped");

    Ok(())
}
