//! Leaderboard Service
//!
//! Caller-facing operations. Each query takes exactly one store snapshot and
//! derives every number it reports from that snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::clock::Clock;
use crate::core::record::{GameType, NewResult, RecordId, ResultRecord, UserId};
use crate::core::window::{current_week, Window};
use crate::ranking::{Leaderboard, RankingEntry};
use crate::store::{ResultStore, StoreError};

/// Service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The result store failed. Propagated unchanged, never retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// No record with this id.
    #[error("result not found: {0}")]
    NotFound(RecordId),
}

/// Which records a ranking covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingScope {
    /// Every record ever stored.
    #[default]
    AllTime,
    /// Records created in the current week window.
    Weekly,
}

/// A ranking list together with the key it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingView {
    /// Game type.
    pub game_type: GameType,
    /// Requested scope.
    pub scope: RankingScope,
    /// Window used, for weekly scope.
    pub window: Option<Window>,
    /// Distinct players on the leaderboard.
    pub player_count: usize,
    /// Top entries.
    pub entries: Vec<RankingEntry>,
}

/// Everything reported back after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    /// The stored record.
    pub record: ResultRecord,
    /// Rank of this round's own score on the all-time leaderboard.
    pub round_rank: u32,
    /// Player's all-time best score (including this round).
    pub best_score: u32,
    /// Rank of the all-time best score.
    pub all_time_rank: u32,
    /// Player's best score this week.
    pub weekly_best_score: Option<u32>,
    /// Rank of the weekly best score on the weekly leaderboard.
    pub weekly_rank: Option<u32>,
    /// Week window the weekly numbers refer to.
    pub week: Window,
}

/// A player's best record and where it ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    /// Best record in scope.
    pub record: ResultRecord,
    /// Shared rank of its score.
    pub rank: u32,
}

/// Leaderboard queries over a result store.
pub struct LeaderboardService {
    store: Arc<dyn ResultStore>,
    clock: Arc<dyn Clock>,
}

impl LeaderboardService {
    /// Create a service over a store.
    pub fn new(store: Arc<dyn ResultStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The week window containing `now`.
    pub fn get_current_week_window(&self, now: DateTime<Utc>) -> Window {
        current_week(now)
    }

    /// The week window containing the service clock's current instant.
    pub fn current_week(&self) -> Window {
        current_week(self.clock.now())
    }

    /// Window for a scope, resolved now.
    pub fn resolve_scope(&self, scope: RankingScope) -> Option<Window> {
        match scope {
            RankingScope::AllTime => None,
            RankingScope::Weekly => Some(self.current_week()),
        }
    }

    /// Build one leaderboard snapshot.
    pub async fn leaderboard(
        &self,
        game_type: GameType,
        window: Option<Window>,
    ) -> Result<Leaderboard, ServiceError> {
        let records = self.store.fetch_records(game_type, window).await?;
        Ok(Leaderboard::build(&records, game_type, window))
    }

    /// Top `n` distinct players.
    #[instrument(skip(self))]
    pub async fn get_top_n(
        &self,
        game_type: GameType,
        n: usize,
        window: Option<Window>,
    ) -> Result<Vec<RankingEntry>, ServiceError> {
        let board = self.leaderboard(game_type, window).await?;
        Ok(board.top_n(n))
    }

    /// Rank of `score` among all players' best scores.
    ///
    /// `user_id` identifies the caller for logging only; the caller's own best
    /// is counted like everyone else's.
    #[instrument(skip(self))]
    pub async fn get_rank(
        &self,
        game_type: GameType,
        user_id: &UserId,
        score: u32,
        window: Option<Window>,
    ) -> Result<u32, ServiceError> {
        let board = self.leaderboard(game_type, window).await?;
        let rank = board.rank_of(score);
        debug!("{} ranks {} with {} of {} players", user_id, rank, score, board.player_count());
        Ok(rank)
    }

    /// Ranking list for a scope, echoing the window used.
    #[instrument(skip(self))]
    pub async fn ranking(
        &self,
        game_type: GameType,
        n: usize,
        scope: RankingScope,
    ) -> Result<RankingView, ServiceError> {
        let window = self.resolve_scope(scope);
        let board = self.leaderboard(game_type, window).await?;

        Ok(RankingView {
            game_type,
            scope,
            window,
            player_count: board.player_count(),
            entries: board.top_n(n),
        })
    }

    /// A player's best record with its rank, both from one snapshot.
    #[instrument(skip(self))]
    pub async fn get_player_best(
        &self,
        game_type: GameType,
        user_id: &UserId,
        window: Option<Window>,
    ) -> Result<Option<PlayerStanding>, ServiceError> {
        let board = self.leaderboard(game_type, window).await?;
        Ok(board.best_of(user_id).map(|record| PlayerStanding {
            record: record.clone(),
            rank: board.rank_of(record.score),
        }))
    }

    /// A single stored result.
    pub async fn get_result(&self, id: RecordId) -> Result<ResultRecord, ServiceError> {
        self.store
            .find_record(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Store a result and report its standing.
    ///
    /// All-time and weekly numbers come from one snapshot taken after the
    /// insert. The week is the one containing the record's own `created_at`.
    #[instrument(skip(self), fields(user = %result.user_id, game = %result.game_type))]
    pub async fn submit_result(&self, result: NewResult) -> Result<SubmissionOutcome, ServiceError> {
        let record = self.store.insert_record(result).await?;
        let records = self.store.fetch_records(record.game_type, None).await?;
        let week = current_week(record.created_at);

        let all_time = Leaderboard::build(&records, record.game_type, None);
        let weekly = Leaderboard::build(&records, record.game_type, Some(week));

        let round_rank = all_time.rank_of(record.score);
        let best_score = all_time
            .best_of(&record.user_id)
            .map_or(record.score, |best| best.score);
        let all_time_rank = all_time.rank_of(best_score);

        let weekly_best_score = weekly.best_of(&record.user_id).map(|best| best.score);
        let weekly_rank = weekly_best_score.map(|score| weekly.rank_of(score));

        info!(
            "Stored result {} (score {}, round rank {}, best {} at rank {})",
            record.id, record.score, round_rank, best_score, all_time_rank
        );

        Ok(SubmissionOutcome {
            record,
            round_rank,
            best_score,
            all_time_rank,
            weekly_best_score,
            weekly_rank,
            week,
        })
    }

    /// Name of the backing store.
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

// =============================================================================
// TESTS
// =============================================================================
