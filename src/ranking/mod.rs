//! Ranking Module
//!
//! Pure functions from a record snapshot to read models. No I/O, no locking.
//!
//! ## Module Structure
//!
//! - `reducer`: best record per player, with the total tie-break order
//! - `assembler`: ordering and top-N slicing
//! - `rank`: shared-rank calculation for a score
//! - `leaderboard`: one snapshot bundling the three

pub mod reducer;
pub mod assembler;
pub mod rank;
pub mod leaderboard;

// Re-export key types
pub use reducer::{ranking_order, ranks_before, reduce, BestRecords};
pub use assembler::{number_entries, top_n, RankingEntry};
pub use rank::rank_of;
pub use leaderboard::Leaderboard;
