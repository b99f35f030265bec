//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON objects tagged by a `type` field.

use serde::{Deserialize, Serialize};

use crate::core::record::{GameType, NewResult, RecordId, ResultRecord, UserId};
use crate::core::window::Window;
use crate::service::{RankingScope, RankingView, SubmissionOutcome};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Store a game result. The player id is trusted as given.
    SubmitResult(NewResult),

    /// Request a top-N ranking list.
    GetRanking(RankingRequest),

    /// Request the rank of a score.
    GetRank(RankRequest),

    /// Fetch one stored result.
    GetResult {
        /// Record id (UUID string).
        id: RecordId,
    },

    /// Request a player's best record.
    GetPlayerBest(PlayerBestRequest),

    /// Request the current weekly window.
    GetWeek,

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

/// Ranking list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRequest {
    /// Leaderboard to read.
    pub game_type: GameType,
    /// Number of entries; server default if absent.
    #[serde(default)]
    pub limit: Option<usize>,
    /// All-time or weekly.
    #[serde(default)]
    pub scope: RankingScope,
}

/// Rank request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    /// Leaderboard to read.
    pub game_type: GameType,
    /// Asking player.
    pub user_id: UserId,
    /// Score to rank.
    pub score: u32,
    /// All-time or weekly.
    #[serde(default)]
    pub scope: RankingScope,
}

/// Player best request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBestRequest {
    /// Leaderboard to read.
    pub game_type: GameType,
    /// Player.
    pub user_id: UserId,
    /// All-time or weekly.
    #[serde(default)]
    pub scope: RankingScope,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Result stored.
    Submitted(SubmissionOutcome),

    /// Ranking list.
    Ranking(RankingView),

    /// Rank of a score.
    Rank(RankResponse),

    /// A stored result.
    Result(ResultRecord),

    /// A player's best record.
    PlayerBest(PlayerBestResponse),

    /// Current weekly window.
    Week(Window),

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server time (Unix millis).
        server_time: i64,
    },

    /// Error message.
    Error(ErrorMessage),

    /// Server is shutting down.
    Shutdown {
        /// Human-readable reason.
        reason: String,
    },
}

/// Rank response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    /// Leaderboard read.
    pub game_type: GameType,
    /// Scope used.
    pub scope: RankingScope,
    /// Window used, for weekly scope.
    pub window: Option<Window>,
    /// Score ranked.
    pub score: u32,
    /// 1-based shared rank.
    pub rank: u32,
}

/// Player best response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBestResponse {
    /// Leaderboard read.
    pub game_type: GameType,
    /// Player.
    pub user_id: UserId,
    /// Scope used.
    pub scope: RankingScope,
    /// Best record, if the player has one in scope.
    pub record: Option<ResultRecord>,
    /// Rank of that record's score.
    pub rank: Option<u32>,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed message or unknown game type.
    InvalidInput,
    /// Requested result does not exist.
    NotFound,
    /// Result store failed.
    StorageUnavailable,
    /// Server-side failure.
    Internal,
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerMessage {
    /// Build an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code,
            message: message.into(),
        })
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize from a binary frame carrying JSON.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl ServerMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_result_decoding() {
        let json = r#"{"type":"submit_result","userId":"google-123","gameType":"SKY_DROP","score":120,"playTime":45}"#;
        let msg = ClientMessage::from_json(json).unwrap();

        let expected = NewResult::new("google-123", GameType::SkyDrop, 120).with_play_time(45);
        assert_eq!(msg, ClientMessage::SubmitResult(expected));
    }

    #[test]
    fn test_ranking_request_defaults() {
        let json = r#"{"type":"get_ranking","gameType":"BLOCK_TOWER"}"#;
        let msg = ClientMessage::from_json(json).unwrap();

        match msg {
            ClientMessage::GetRanking(req) => {
                assert_eq!(req.game_type, GameType::BlockTower);
                assert_eq!(req.limit, None);
                assert_eq!(req.scope, RankingScope::AllTime);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_weekly_scope_decoding() {
        let json = r#"{"type":"get_rank","gameType":"SKY_DROP","userId":"u","score":5,"scope":"weekly"}"#;
        let msg = ClientMessage::from_json(json).unwrap();
        assert!(matches!(msg, ClientMessage::GetRank(RankRequest { scope: RankingScope::Weekly, .. })));
    }

    #[test]
    fn test_unknown_game_type_rejected() {
        let json = r#"{"type":"get_ranking","gameType":"TETRIS"}"#;
        assert!(ClientMessage::from_json(json).is_err());
    }

    #[test]
    fn test_negative_score_rejected() {
        let json = r#"{"type":"submit_result","userId":"u","gameType":"SKY_DROP","score":-1}"#;
        assert!(ClientMessage::from_json(json).is_err());
    }

    #[test]
    fn test_get_result_requires_uuid() {
        let ok = r#"{"type":"get_result","id":"123e4567-e89b-12d3-a456-426614174000"}"#;
        assert!(ClientMessage::from_json(ok).is_ok());

        let bad = r#"{"type":"get_result","id":"42"}"#;
        assert!(ClientMessage::from_json(bad).is_err());
    }

    #[test]
    fn test_binary_frames_carry_json() {
        let msg = ClientMessage::Ping { timestamp: 7 };
        let bytes = msg.to_json().unwrap().into_bytes();
        assert_eq!(ClientMessage::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_error_message_shape() {
        let msg = ServerMessage::error(ErrorCode::NotFound, "result not found");
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["message"], "result not found");
        assert_eq!(ServerMessage::from_json(&msg.to_json().unwrap()).unwrap(), msg);
    }
}
