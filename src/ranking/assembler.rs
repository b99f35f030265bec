//! Ranking Assembly
//!
//! Orders a best-score set and slices the top N.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::record::{RecordId, ResultRecord, UserId};
use crate::ranking::reducer::{ranking_order, BestRecords};

/// One row of a ranking list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// 1-based position in the list. Unique per entry.
    pub position: u32,
    /// Shared rank: equal scores get equal ranks.
    pub rank: u32,
    /// Record holding the player's best score.
    pub record_id: RecordId,
    /// Player.
    pub user_id: UserId,
    /// Best score.
    pub score: u32,
    /// When the best score was achieved.
    pub created_at: DateTime<Utc>,
}

/// Top `n` best records in ranking order.
///
/// Returns fewer than `n` entries when fewer players exist.
pub fn top_n(best: &BestRecords, n: usize) -> Vec<&ResultRecord> {
    if n == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&ResultRecord> = best.values().collect();

    // Partition first so only the kept prefix is sorted.
    if n < ordered.len() {
        ordered.select_nth_unstable_by(n - 1, |a, b| ranking_order(a, b));
        ordered.truncate(n);
    }
    ordered.sort_unstable_by(|a, b| ranking_order(a, b));

    ordered
}

/// Number ordered records into ranking entries.
///
/// `ordered` must be a ranking-ordered prefix of a best-score set. Every
/// strictly higher score is then already in the prefix, so the shared rank
/// equals the position of the first entry with the same score.
pub fn number_entries(ordered: &[&ResultRecord]) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = Vec::with_capacity(ordered.len());

    for (idx, record) in ordered.iter().enumerate() {
        let position = idx as u32 + 1;
        let rank = match entries.last() {
            Some(prev) if prev.score == record.score => prev.rank,
            _ => position,
        };

        entries.push(RankingEntry {
            position,
            rank,
            record_id: record.id,
            user_id: record.user_id.clone(),
            score: record.score,
            created_at: record.created_at,
        });
    }

    entries
}

// =============================================================================
// TESTS
// =============================================================================
