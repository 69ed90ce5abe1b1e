//! Global ranking snapshots.
//!
//! A snapshot is one immutable, timestamped ranking of every fighter.
//! Exactly one snapshot is current at any time; promotion supersedes the
//! previous current snapshot, it never edits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FighterId;

/// Accumulated career statistics for one fighter, the input to scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FighterResume {
    pub fighter_id: FighterId,
    /// Wins and fights across all competitions the fighter has history for
    pub total_wins: u32,
    pub total_fights: u32,
    pub league_titles: u32,
    pub champions_cup_titles: u32,
    pub invicta_cup_titles: u32,
    pub champions_cup_appearances: u32,
    pub invicta_cup_appearances: u32,
    pub division1_appearances: u32,
    pub division2_appearances: u32,
    pub division3_appearances: u32,
    /// Max count among all win-type streaks, active or closed
    pub longest_win_streak: u32,
}

impl FighterResume {
    pub fn new(fighter_id: FighterId) -> Self {
        Self {
            fighter_id,
            ..Default::default()
        }
    }

    /// Win percentage across all recorded fights, 0.0 for a blank record.
    pub fn overall_win_percentage(&self) -> f64 {
        if self.total_fights == 0 {
            0.0
        } else {
            self.total_wins as f64 / self.total_fights as f64 * 100.0
        }
    }

    /// Titles across all three competitions.
    pub fn total_titles(&self) -> u32 {
        self.league_titles + self.champions_cup_titles + self.invicta_cup_titles
    }
}

/// One fighter's row in a global ranking snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    pub fighter_id: FighterId,
    pub score: f64,
    /// Dense rank, 1..N over all fighters
    pub rank: u32,
    pub titles: u32,
    pub cup_appearances: u32,
    pub league_appearances: u32,
}

/// One immutable, versioned ranking generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalRankSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Exactly one snapshot is current at any time
    pub is_current: bool,
    /// Rows ordered by rank ascending
    pub entries: Vec<RankEntry>,
}

impl GlobalRankSnapshot {
    /// Create a new, not-yet-current snapshot. Entries are expected to
    /// already be rank-ordered.
    pub fn new(entries: Vec<RankEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            is_current: false,
            entries,
        }
    }

    /// Look up a fighter's entry.
    pub fn entry_of(&self, fighter_id: &FighterId) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.fighter_id == *fighter_id)
    }
}
