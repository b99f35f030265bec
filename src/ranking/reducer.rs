//! Best-Score Reduction
//!
//! Collapses a record set into one best record per player.
//! Uses BTreeMap so iteration never depends on hashing or insertion order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::record::{GameType, ResultRecord, UserId};
use crate::core::window::Window;

/// Best record per player for one leaderboard partition.
pub type BestRecords = BTreeMap<UserId, ResultRecord>;

/// Total ranking order over records.
///
/// Higher score first, then earlier `created_at`, then lower id.
/// `Ordering::Less` means `a` ranks ahead of `b`.
#[inline]
pub fn ranking_order(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Check whether `a` ranks strictly ahead of `b`.
#[inline]
pub fn ranks_before(a: &ResultRecord, b: &ResultRecord) -> bool {
    ranking_order(a, b) == Ordering::Less
}

/// Reduce records to each player's best record for `game_type`.
///
/// Records of other game types, and records outside `window` when one is
/// given, are ignored. Empty input yields an empty map.
pub fn reduce<'a, I>(records: I, game_type: GameType, window: Option<&Window>) -> BestRecords
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let mut best = BestRecords::new();

    for record in records {
        if record.game_type != game_type {
            continue;
        }
        if let Some(window) = window {
            if !window.contains(record.created_at) {
                continue;
            }
        }

        match best.get_mut(&record.user_id) {
            Some(current) => {
                if ranks_before(record, current) {
                    *current = record.clone();
                }
            }
            None => {
                best.insert(record.user_id.clone(), record.clone());
            }
        }
    }

    best
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordId;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn record(id: u8, user: &str, game_type: GameType, score: u32, at: DateTime<Utc>) -> ResultRecord {
        ResultRecord {
            id: RecordId::new([id; 16]),
            user_id: UserId::new(user),
            game_type,
            score,
            play_time: None,
            created_at: at,
        }
    }

    #[test]
    fn test_keeps_highest_score_per_user() {
        let records = vec![
            record(1, "u1", GameType::SkyDrop, 100, t(0)),
            record(2, "u2", GameType::SkyDrop, 200, t(1)),
            record(3, "u1", GameType::SkyDrop, 150, t(2)),
        ];

        let best = reduce(&records, GameType::SkyDrop, None);

        assert_eq!(best.len(), 2);
        assert_eq!(best[&UserId::new("u1")].score, 150);
        assert_eq!(best[&UserId::new("u2")].score, 200);
    }

    #[test]
    fn test_equal_scores_keep_earliest() {
        let records = vec![
            record(1, "u1", GameType::SkyDrop, 100, t(5)),
            record(2, "u1", GameType::SkyDrop, 100, t(3)),
            record(3, "u1", GameType::SkyDrop, 100, t(9)),
        ];

        let best = reduce(&records, GameType::SkyDrop, None);
        assert_eq!(best[&UserId::new("u1")].id, RecordId::new([2; 16]));
    }

    #[test]
    fn test_equal_score_and_time_keep_lowest_id() {
        let records = vec![
            record(7, "u1", GameType::SkyDrop, 100, t(0)),
            record(4, "u1", GameType::SkyDrop, 100, t(0)),
            record(9, "u1", GameType::SkyDrop, 100, t(0)),
        ];

        let best = reduce(&records, GameType::SkyDrop, None);
        assert_eq!(best[&UserId::new("u1")].id, RecordId::new([4; 16]));
    }

    #[test]
    fn test_filters_other_game_types() {
        let records = vec![
            record(1, "u1", GameType::SkyDrop, 100, t(0)),
            record(2, "u1", GameType::BlockTower, 900, t(1)),
            record(3, "u2", GameType::BlockTower, 50, t(2)),
        ];

        let best = reduce(&records, GameType::SkyDrop, None);
        assert_eq!(best.len(), 1);
        assert_eq!(best[&UserId::new("u1")].score, 100);
    }

    #[test]
    fn test_window_boundaries() {
        let window = Window::new(t(10), t(20));
        let ms = Duration::milliseconds(1);
        let records = vec![
            record(1, "at-start", GameType::SkyDrop, 1, t(10)),
            record(2, "at-end", GameType::SkyDrop, 1, t(20)),
            record(3, "before", GameType::SkyDrop, 1, t(10) - ms),
            record(4, "after", GameType::SkyDrop, 1, t(20) + ms),
        ];

        let best = reduce(&records, GameType::SkyDrop, Some(&window));
        let users: Vec<_> = best.keys().map(UserId::as_str).collect();
        assert_eq!(users, vec!["at-end", "at-start"]);
    }

    #[test]
    fn test_window_drops_out_of_window_best() {
        let window = Window::new(t(10), t(20));
        let records = vec![
            record(1, "u1", GameType::SkyDrop, 500, t(0)),
            record(2, "u1", GameType::SkyDrop, 80, t(15)),
        ];

        let best = reduce(&records, GameType::SkyDrop, Some(&window));
        assert_eq!(best[&UserId::new("u1")].score, 80);
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<ResultRecord> = Vec::new();
        assert!(reduce(&records, GameType::SkyDrop, None).is_empty());
    }

    #[test]
    fn test_ranking_order_is_total() {
        let a = record(1, "a", GameType::SkyDrop, 100, t(0));
        let b = record(2, "b", GameType::SkyDrop, 100, t(0));
        let c = record(3, "c", GameType::SkyDrop, 100, t(1));
        let d = record(4, "d", GameType::SkyDrop, 101, t(9));

        assert_eq!(ranking_order(&a, &b), Ordering::Less);
        assert_eq!(ranking_order(&b, &a), Ordering::Greater);
        assert_eq!(ranking_order(&b, &c), Ordering::Less);
        assert_eq!(ranking_order(&d, &a), Ordering::Less);
        assert_eq!(ranking_order(&a, &a), Ordering::Equal);
    }
}
