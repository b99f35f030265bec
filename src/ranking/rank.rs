//! Rank Calculation
//!
//! A score's rank is one more than the number of players whose best score is
//! strictly higher. Equal scores therefore share a rank.

use crate::ranking::reducer::BestRecords;

/// Rank of `score` among the players in `best` (1-based).
///
/// An empty set ranks every score first.
pub fn rank_of(best: &BestRecords, score: u32) -> u32 {
    let higher = best.values().filter(|r| r.score > score).count();
    u32::try_from(higher).unwrap_or(u32::MAX).saturating_add(1)
}
