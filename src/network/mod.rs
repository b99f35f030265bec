//! Network Layer
//!
//! WebSocket front end over the leaderboard service.
//! Message decoding is where unknown game types and malformed input are
//! rejected; nothing past this layer validates input.

pub mod protocol;
pub mod server;

pub use protocol::{
    ClientMessage, ErrorCode, ErrorMessage, PlayerBestRequest, PlayerBestResponse,
    RankRequest, RankResponse, RankingRequest, ServerMessage,
};
pub use server::{
    handle_client_message, ConfigError, LeaderboardServer, LeaderboardServerError, ServerConfig,
};
