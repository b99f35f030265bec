//! Result Record Definitions
//!
//! The immutable unit of input for every ranking query.
//! Records are appended by a store and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// RECORD ID
// =============================================================================

/// Unique result identifier (UUID as bytes).
///
/// Implements Ord for the final ranking tie-break: lower bytes rank first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecordId(pub [u8; 16]);

impl RecordId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

/// Error parsing a record identifier.
#[derive(Debug, Clone, Error)]
#[error("invalid record id: {0}")]
pub struct ParseRecordIdError(String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.into_bytes()))
            .map_err(|_| ParseRecordIdError(s.to_string()))
    }
}

// Records travel as UUID strings, not byte arrays.
impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        uuid::Uuid::from_bytes(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(|u| Self(u.into_bytes()))
    }
}

// =============================================================================
// USER ID
// =============================================================================

/// Owning player identifier.
///
/// Opaque to the ranking engine; upstream authentication decides its content.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// GAME TYPE
// =============================================================================

/// Game variant. Each variant is an independent leaderboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    /// Falling-block dodging game.
    SkyDrop,
    /// Block stacking game.
    BlockTower,
}

impl GameType {
    /// All known game types.
    pub const ALL: [GameType; 2] = [GameType::SkyDrop, GameType::BlockTower];

    /// Wire name of this game type.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::SkyDrop => "SKY_DROP",
            GameType::BlockTower => "BLOCK_TOWER",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a game type name.
#[derive(Debug, Clone, Error)]
#[error("unknown game type: {0}")]
pub struct ParseGameTypeError(String);

impl FromStr for GameType {
    type Err = ParseGameTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseGameTypeError(s.to_string()))
    }
}

// =============================================================================
// RESULT RECORD
// =============================================================================

/// A single stored game result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Unique id, assigned by the store.
    pub id: RecordId,
    /// Player who submitted the result.
    pub user_id: UserId,
    /// Leaderboard partition.
    pub game_type: GameType,
    /// Achieved score.
    pub score: u32,
    /// Play duration in seconds. Not used for ranking.
    #[serde(default)]
    pub play_time: Option<u32>,
    /// Creation instant, assigned by the store.
    pub created_at: DateTime<Utc>,
}

/// A result submission before the store assigns id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    /// Submitting player.
    pub user_id: UserId,
    /// Leaderboard partition.
    pub game_type: GameType,
    /// Achieved score.
    pub score: u32,
    /// Play duration in seconds.
    #[serde(default)]
    pub play_time: Option<u32>,
}

impl NewResult {
    /// Create a submission without play time.
    pub fn new(user_id: impl Into<String>, game_type: GameType, score: u32) -> Self {
        Self {
            user_id: UserId::new(user_id),
            game_type,
            score,
            play_time: None,
        }
    }

    /// Attach a play time in seconds.
    pub fn with_play_time(mut self, seconds: u32) -> Self {
        self.play_time = Some(seconds);
        self
    }

    /// Turn into a stored record.
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> ResultRecord {
        ResultRecord {
            id,
            user_id: self.user_id,
            game_type: self.game_type,
            score: self.score,
            play_time: self.play_time,
            created_at,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
