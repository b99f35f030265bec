//! # Leaderboard Server
//!
//! Per-game leaderboards ranked by each player's best score, with all-time
//! and weekly (UTC+9 calendar week) variants.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LEADERBOARD SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure primitives                           │
//! │  ├── record.rs   - Result records, ids, game types           │
//! │  ├── window.rs   - Weekly window resolution                  │
//! │  └── clock.rs    - Injectable time source                    │
//! │                                                              │
//! │  ranking/        - Ranking logic (deterministic)             │
//! │  ├── reducer.rs  - Best record per player, tie-break order   │
//! │  ├── assembler.rs- Top-N ordering                            │
//! │  ├── rank.rs     - Shared rank of a score                    │
//! │  └── leaderboard.rs - One snapshot per (game, window)        │
//! │                                                              │
//! │  store/          - Append-only result storage                │
//! │  service.rs      - Caller-facing operations                  │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket server, config                  │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `ranking/` module is a pure function of a record snapshot:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No clock reads (windows are resolved from an explicit `now`)
//! - A total order on records (score, then time, then id)
//!
//! The same snapshot always yields the same list and the same ranks,
//! whatever order the store returned the records in.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod ranking;
pub mod store;
pub mod service;
pub mod network;

// Re-export commonly used types
pub use crate::core::record::{GameType, NewResult, RecordId, ResultRecord, UserId};
pub use crate::core::window::{current_week, Window};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use ranking::{Leaderboard, RankingEntry};
pub use service::{LeaderboardService, RankingScope, ServiceError, SubmissionOutcome};
pub use store::{FileStore, MemoryStore, ResultStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default ranking length.
pub const DEFAULT_TOP_N: usize = 10;
