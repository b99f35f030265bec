//! WebSocket Leaderboard Server
//!
//! Async WebSocket server. Decodes client messages, runs them against the
//! leaderboard service and replies on the same connection.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::protocol::{
    ClientMessage, ErrorCode, PlayerBestResponse, RankResponse, ServerMessage,
};
use crate::service::{LeaderboardService, ServiceError};
use crate::store::StoreError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Close connections idle for this long.
    pub idle_timeout: Duration,
    /// Ranking length when the client does not ask for one.
    pub top_n: usize,
    /// Largest ranking length a client may ask for.
    pub max_top_n: usize,
    /// Result log location. `None` keeps results in memory.
    pub data_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            top_n: 10,
            max_top_n: 100,
            data_path: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            bind_addr: parse_var(&lookup, "LEADERBOARD_BIND_ADDR", defaults.bind_addr)?,
            max_connections: parse_var(&lookup, "LEADERBOARD_MAX_CONNECTIONS", defaults.max_connections)?,
            idle_timeout: Duration::from_secs(parse_var(
                &lookup,
                "LEADERBOARD_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )?),
            top_n: parse_var(&lookup, "LEADERBOARD_TOP_N", defaults.top_n)?,
            max_top_n: parse_var(&lookup, "LEADERBOARD_MAX_TOP_N", defaults.max_top_n)?,
            data_path: lookup("LEADERBOARD_DATA_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        };

        if config.top_n == 0 || config.top_n > config.max_top_n {
            return Err(ConfigError::Invalid {
                var: "LEADERBOARD_TOP_N",
                value: config.top_n.to_string(),
            });
        }

        Ok(config)
    }

    /// Ranking length for a client request.
    pub fn ranking_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.top_n).clamp(1, self.max_top_n)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Connected client bookkeeping.
struct ConnectedClient {
    connected_at: Instant,
    messages: u64,
}

type ClientMap = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// The leaderboard server.
pub struct LeaderboardServer {
    config: ServerConfig,
    service: Arc<LeaderboardService>,
    clients: ClientMap,
    shutdown_tx: broadcast::Sender<()>,
}

impl LeaderboardServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, service: Arc<LeaderboardService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            service,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), LeaderboardServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), LeaderboardServerError> {
        info!(
            "Leaderboard server listening on {} (store: {})",
            listener.local_addr()?,
            self.service.store_name()
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            // Count the connection from accept, not from handshake.
                            let mut clients = self.clients.write().await;
                            if clients.len() >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            clients.insert(addr, ConnectedClient {
                                connected_at: Instant::now(),
                                messages: 0,
                            });
                            drop(clients);

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let service = self.service.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match timeout(config.idle_timeout, accept_async(stream)).await {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    clients.write().await.remove(&addr);
                    return;
                }
                Err(_) => {
                    debug!("Handshake with {} timed out", addr);
                    clients.write().await.remove(&addr);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            loop {
                tokio::select! {
                    next = timeout(config.idle_timeout, ws_receiver.next()) => {
                        let decoded = match next {
                            Err(_) => {
                                debug!("Client {} idle, closing", addr);
                                break;
                            }
                            Ok(Some(Ok(Message::Text(text)))) => ClientMessage::from_json(&text),
                            Ok(Some(Ok(Message::Binary(data)))) => ClientMessage::from_bytes(&data),
                            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Ok(Some(Err(e))) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // Ping/pong frames are answered by tungstenite.
                            Ok(Some(Ok(_))) => continue,
                        };

                        if let Some(client) = clients.write().await.get_mut(&addr) {
                            client.messages += 1;
                        }

                        let reply = match decoded {
                            Ok(msg) => handle_client_message(&service, &config, msg).await,
                            Err(e) => {
                                debug!("Invalid message from {}: {}", addr, e);
                                ServerMessage::error(ErrorCode::InvalidInput, format!("Invalid message: {}", e))
                            }
                        };

                        if msg_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Let the sender drain queued replies, then close.
            drop(msg_tx);
            let _ = sender_task.await;

            if let Some(client) = clients.write().await.remove(&addr) {
                info!(
                    "Client {} cleaned up after {:?} ({} messages)",
                    addr,
                    client.connected_at.elapsed(),
                    client.messages
                );
            }
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait until all connections have closed, or `limit` elapses.
    pub async fn drain(&self, limit: Duration) {
        let deadline = Instant::now() + limit;
        while self.connection_count().await > 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

/// Run one client message against the service.
pub async fn handle_client_message(
    service: &LeaderboardService,
    config: &ServerConfig,
    msg: ClientMessage,
) -> ServerMessage {
    let result = match msg {
        ClientMessage::SubmitResult(result) => service
            .submit_result(result)
            .await
            .map(ServerMessage::Submitted),
        ClientMessage::GetRanking(req) => service
            .ranking(req.game_type, config.ranking_limit(req.limit), req.scope)
            .await
            .map(ServerMessage::Ranking),
        ClientMessage::GetRank(req) => {
            let window = service.resolve_scope(req.scope);
            service
                .get_rank(req.game_type, &req.user_id, req.score, window)
                .await
                .map(|rank| {
                    ServerMessage::Rank(RankResponse {
                        game_type: req.game_type,
                        scope: req.scope,
                        window,
                        score: req.score,
                        rank,
                    })
                })
        }
        ClientMessage::GetResult { id } => service.get_result(id).await.map(ServerMessage::Result),
        ClientMessage::GetPlayerBest(req) => {
            let window = service.resolve_scope(req.scope);
            service
                .get_player_best(req.game_type, &req.user_id, window)
                .await
                .map(|standing| {
                    let (record, rank) = match standing {
                        Some(s) => (Some(s.record), Some(s.rank)),
                        None => (None, None),
                    };
                    ServerMessage::PlayerBest(PlayerBestResponse {
                        game_type: req.game_type,
                        user_id: req.user_id,
                        scope: req.scope,
                        record,
                        rank,
                    })
                })
        }
        ClientMessage::GetWeek => Ok(ServerMessage::Week(service.current_week())),
        ClientMessage::Ping { timestamp } => Ok(ServerMessage::Pong {
            timestamp,
            server_time: Utc::now().timestamp_millis(),
        }),
    };

    result.unwrap_or_else(|e| error_reply(&e))
}

fn error_reply(err: &ServiceError) -> ServerMessage {
    match err {
        ServiceError::NotFound(_) => ServerMessage::error(ErrorCode::NotFound, err.to_string()),
        ServiceError::Store(StoreError::Encode(_)) => {
            error!("Store rejected record: {}", err);
            ServerMessage::error(ErrorCode::Internal, "Internal server error")
        }
        ServiceError::Store(_) => {
            error!("Store failure: {}", err);
            ServerMessage::error(ErrorCode::StorageUnavailable, "Result storage unavailable")
        }
    }
}
