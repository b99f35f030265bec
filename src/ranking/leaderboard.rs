//! Leaderboard Snapshot
//!
//! One reduced best-score set for one `(game type, window)` key. A ranking
//! list and a rank read from the same snapshot always agree.

use crate::core::record::{GameType, ResultRecord, UserId};
use crate::core::window::Window;
use crate::ranking::assembler::{number_entries, top_n, RankingEntry};
use crate::ranking::rank::rank_of;
use crate::ranking::reducer::{reduce, BestRecords};

/// Immutable best-score snapshot for one leaderboard.
#[derive(Clone, Debug)]
pub struct Leaderboard {
    best: BestRecords,
}

impl Leaderboard {
    /// Reduce a record set into a leaderboard.
    pub fn build<'a, I>(records: I, game_type: GameType, window: Option<Window>) -> Self
    where
        I: IntoIterator<Item = &'a ResultRecord>,
    {
        Self {
            best: reduce(records, game_type, window.as_ref()),
        }
    }

    /// Number of distinct players.
    pub fn player_count(&self) -> usize {
        self.best.len()
    }

    /// Top `n` players as numbered entries.
    pub fn top_n(&self, n: usize) -> Vec<RankingEntry> {
        number_entries(&top_n(&self.best, n))
    }

    /// Rank of an arbitrary score.
    pub fn rank_of(&self, score: u32) -> u32 {
        rank_of(&self.best, score)
    }

    /// A player's best record.
    pub fn best_of(&self, user_id: &UserId) -> Option<&ResultRecord> {
        self.best.get(user_id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordId;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap()
    }

    /// Build records from `(user, score, seconds)` tuples; ids follow input index.
    fn records(raw: &[(u8, u32, i64)]) -> Vec<ResultRecord> {
        raw.iter()
            .enumerate()
            .map(|(idx, &(user, score, secs))| {
                let mut id = [0u8; 16];
                id[..8].copy_from_slice(&(idx as u64).to_be_bytes());
                ResultRecord {
                    id: RecordId::new(id),
                    user_id: UserId::new(format!("u{}", user)),
                    game_type: GameType::SkyDrop,
                    score,
                    play_time: None,
                    created_at: base() + Duration::seconds(secs),
                }
            })
            .collect()
    }

    fn raw_records() -> impl Strategy<Value = Vec<(u8, u32, i64)>> {
        prop::collection::vec((0u8..8, 0u32..20, 0i64..10), 0..40)
    }

    #[test]
    fn test_sky_drop_scenario() {
        let records = records(&[(1, 100, 0), (2, 200, 1), (1, 150, 2)]);
        let board = Leaderboard::build(&records, GameType::SkyDrop, None);

        let top = board.top_n(2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].user_id.as_str(), top[0].score), ("u2", 200));
        assert_eq!((top[1].user_id.as_str(), top[1].score), ("u1", 150));

        assert_eq!(board.rank_of(120), 2);
        assert_eq!(board.rank_of(250), 1);
        assert_eq!(board.best_of(&UserId::new("u1")).map(|r| board.rank_of(r.score)), Some(2));
        assert!(board.best_of(&UserId::new("u9")).is_none());
    }

    #[test]
    fn test_weekly_snapshot_from_same_records() {
        let records = records(&[(1, 500, 0), (1, 80, 100), (2, 90, 100)]);
        let window = Window::new(base() + Duration::seconds(50), base() + Duration::seconds(200));

        let all_time = Leaderboard::build(&records, GameType::SkyDrop, None);
        let weekly = Leaderboard::build(&records, GameType::SkyDrop, Some(window));

        let u1 = UserId::new("u1");
        assert_eq!(all_time.best_of(&u1).map(|r| all_time.rank_of(r.score)), Some(1));
        assert_eq!(weekly.best_of(&u1).map(|r| weekly.rank_of(r.score)), Some(2));
        assert_eq!(weekly.player_count(), 2);
    }

    #[test]
    fn test_empty_leaderboard() {
        let records: Vec<ResultRecord> = Vec::new();
        let board = Leaderboard::build(&records, GameType::BlockTower, None);
        assert_eq!(board.player_count(), 0);
        assert!(board.top_n(10).is_empty());
        assert_eq!(board.rank_of(0), 1);
    }

    proptest! {
        #[test]
        fn prop_independent_of_input_order(raw in raw_records(), seed in any::<u64>()) {
            let ordered = records(&raw);
            let mut shuffled = ordered.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

            let a = Leaderboard::build(&ordered, GameType::SkyDrop, None);
            let b = Leaderboard::build(&shuffled, GameType::SkyDrop, None);

            prop_assert_eq!(a.top_n(10), b.top_n(10));
            for score in 0..21 {
                prop_assert_eq!(a.rank_of(score), b.rank_of(score));
            }
        }

        #[test]
        fn prop_rank_matches_list(raw in raw_records()) {
            let records = records(&raw);
            let board = Leaderboard::build(&records, GameType::SkyDrop, None);
            let top = board.top_n(usize::MAX);

            prop_assert_eq!(top.len(), board.player_count());
            for (idx, entry) in top.iter().enumerate() {
                prop_assert_eq!(entry.position as usize, idx + 1);
                prop_assert_eq!(board.rank_of(entry.score), entry.rank);
                if entry.rank != entry.position {
                    prop_assert_eq!(top[entry.rank as usize - 1].score, entry.score);
                }
            }
        }

        #[test]
        fn prop_ties_ordered_by_time_then_id(raw in raw_records()) {
            let records = records(&raw);
            let board = Leaderboard::build(&records, GameType::SkyDrop, None);
            let top = board.top_n(usize::MAX);

            for pair in top.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.score >= b.score);
                if a.score == b.score {
                    prop_assert!((a.created_at, a.record_id) < (b.created_at, b.record_id));
                }
            }
        }

        #[test]
        fn prop_non_improving_runs_change_nothing(raw in raw_records(), extra in prop::collection::vec(0u8..8, 0..10)) {
            let mut records = records(&raw);
            let before = Leaderboard::build(&records, GameType::SkyDrop, None);

            // Re-submit each chosen player's best score, later in time.
            for (n, user) in extra.iter().enumerate() {
                let user_id = UserId::new(format!("u{}", user));
                if let Some(best) = before.best_of(&user_id) {
                    let mut again = best.clone();
                    again.id = RecordId::new([0xff, n as u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
                    again.created_at = base() + Duration::seconds(1_000 + n as i64);
                    records.push(again);
                }
            }
            let after = Leaderboard::build(&records, GameType::SkyDrop, None);

            prop_assert_eq!(before.top_n(10), after.top_n(10));
            for score in 0..21 {
                prop_assert_eq!(before.rank_of(score), after.rank_of(score));
            }
        }
    }
}
