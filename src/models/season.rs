//! Season and roster ledger records.

use serde::{Deserialize, Serialize};

use super::{CompetitionId, CompetitionKind, EntityId, FighterId, SeasonId};

/// One division's schedule shape within a league season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionMeta {
    pub division: u32,
    pub total_rounds: u32,
}

/// Registered metadata for one competition season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonMeta {
    /// Unique identifier (derived from competition + season number)
    pub season_id: SeasonId,

    pub competition_id: CompetitionId,
    pub kind: CompetitionKind,
    pub season: u32,

    /// For cup seasons, the league season this cup was spawned from
    pub linked_league_season: Option<SeasonId>,

    /// League divisions; empty for cups
    pub divisions: Vec<DivisionMeta>,
}

impl SeasonMeta {
    /// Register a league season with its division layout.
    pub fn league(competition_id: CompetitionId, season: u32, divisions: Vec<DivisionMeta>) -> Self {
        let season_id = EntityId::generate(&[competition_id.as_str(), &season.to_string()]);
        Self {
            season_id,
            competition_id,
            kind: CompetitionKind::League,
            season,
            linked_league_season: None,
            divisions,
        }
    }

    /// Register a cup season linked back to its league season.
    pub fn cup(
        competition_id: CompetitionId,
        kind: CompetitionKind,
        season: u32,
        linked_league_season: SeasonId,
    ) -> Self {
        let season_id = EntityId::generate(&[competition_id.as_str(), &season.to_string()]);
        Self {
            season_id,
            competition_id,
            kind,
            season,
            linked_league_season: Some(linked_league_season),
            divisions: Vec::new(),
        }
    }
}

/// The fixed roster of one division in one season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub competition_id: CompetitionId,
    pub season: u32,
    pub division: u32,
    pub fighters: Vec<FighterId>,
}
