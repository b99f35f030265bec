//! Core ranking primitives.
//!
//! Record types, the weekly window resolver and the injectable clock.
//! Nothing here performs I/O.

pub mod record;
pub mod window;
pub mod clock;

// Re-export core types
pub use record::{
    GameType, NewResult, ParseGameTypeError, ParseRecordIdError, RecordId, ResultRecord, UserId,
};
pub use window::{current_week, Window, WEEK_ANCHOR_OFFSET_SECS};
pub use clock::{Clock, ManualClock, SystemClock};
