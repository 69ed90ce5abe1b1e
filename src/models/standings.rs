//! Cumulative standings snapshots.
//!
//! One snapshot exists per completed fight in a division; snapshots are
//! append-only and never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CompetitionId, EntityId, FighterId, SnapshotId};

/// One fighter's cumulative row in a standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterStanding {
    pub fighter_id: FighterId,
    pub fights_count: u32,
    pub wins: u32,
    pub points: u32,
    /// Dense rank, 1..N within the division roster
    pub rank: u32,
}

impl FighterStanding {
    /// A zero row for a fighter who has not fought yet.
    pub fn baseline(fighter_id: FighterId) -> Self {
        Self {
            fighter_id,
            fights_count: 0,
            wins: 0,
            points: 0,
            rank: 0,
        }
    }
}

/// Cumulative standings as of one specific completed fight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    /// Unique identifier (derived from competition + season + division + fight identifier)
    pub id: SnapshotId,

    pub competition_id: CompetitionId,
    pub season: u32,
    pub division: u32,
    pub round: u32,

    /// Identifier of the fight this snapshot was computed after
    pub fight_identifier: String,

    /// Roster size; every roster fighter appears in `standings`
    pub total_fighters_count: u32,

    /// Rows ordered by rank ascending
    pub standings: Vec<FighterStanding>,

    /// When this snapshot was computed
    pub computed_at: DateTime<Utc>,
}

impl StandingsSnapshot {
    /// Create a new snapshot. Rows are expected to already be rank-ordered.
    pub fn new(
        competition_id: CompetitionId,
        season: u32,
        division: u32,
        round: u32,
        fight_identifier: String,
        standings: Vec<FighterStanding>,
    ) -> Self {
        let id = EntityId::generate(&[
            competition_id.as_str(),
            &season.to_string(),
            &division.to_string(),
            &fight_identifier,
        ]);

        Self {
            id,
            competition_id,
            season,
            division,
            round,
            fight_identifier,
            total_fighters_count: standings.len() as u32,
            standings,
            computed_at: Utc::now(),
        }
    }

    /// Look up a fighter's row.
    pub fn standing_of(&self, fighter_id: &FighterId) -> Option<&FighterStanding> {
        self.standings.iter().find(|s| s.fighter_id == *fighter_id)
    }

    /// The row currently ranked first, if any.
    pub fn leader(&self) -> Option<&FighterStanding> {
        self.standings.iter().find(|s| s.rank == 1)
    }
}

/// Read-time classification of a final-round standings row.
///
/// Presentation only: the engine never acts on zones, they are a cosmetic
/// interpretation of the final snapshot for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingZone {
    Promotion,
    Safe,
    Relegation,
}

impl StandingZone {
    /// Classify a rank within a roster of `total` fighters: top two promote,
    /// bottom two relegate.
    pub fn classify(rank: u32, total: u32) -> Self {
        if rank <= 2 {
            StandingZone::Promotion
        } else if total >= 2 && rank > total - 2 {
            StandingZone::Relegation
        } else {
            StandingZone::Safe
        }
    }
}
