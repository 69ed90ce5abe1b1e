//! Derived-state computations.
//!
//! Pure functions over plain data records, no I/O:
//! - **standings**: folds one decided fight into a cumulative standings snapshot
//! - **streaks**: replays a fight sequence into streak and head-to-head state
//! - **completion**: checks a league season and its two linked cups for completion
//! - **ranking**: scores every fighter and builds a new global ranking snapshot

use thiserror::Error;

pub mod completion;
pub mod ranking;
pub mod standings;
pub mod streaks;

pub use completion::{check_completion, cup_season_complete, league_season_complete};
pub use ranking::{recalculate, score_fighter, ScoreWeights};
pub use standings::compute_standings;
pub use streaks::replay;

/// Errors raised by engine computations.
///
/// Either kind aborts the unit of work that raised it; nothing partial is
/// persisted by callers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was invoked before its inputs reached the required state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Inputs disagree with each other; indicates an upstream desync.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}
