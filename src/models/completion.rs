//! Season views and completion reports.

use serde::{Deserialize, Serialize};

use super::{Fight, SeasonId};

/// What kind of competition a season belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionKind {
    League,
    ChampionsCup,
    InvictaCup,
}

impl std::fmt::Display for CompetitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompetitionKind::League => write!(f, "league"),
            CompetitionKind::ChampionsCup => write!(f, "Champions Cup"),
            CompetitionKind::InvictaCup => write!(f, "Invicta Cup"),
        }
    }
}

/// One division's schedule within a league season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionView {
    pub division: u32,
    /// Number of rounds scheduled; the division is done when round
    /// `total_rounds` has every fight decided
    pub total_rounds: u32,
    pub fights: Vec<Fight>,
}

/// A league season's full schedule, by division.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSeasonView {
    pub season_id: SeasonId,
    pub season: u32,
    pub divisions: Vec<DivisionView>,
}

/// A cup season's fight list plus the league season it was spawned from.
///
/// Cup seasons are created partway through the league season,
/// asynchronously; a league season may not have its cups yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CupSeasonView {
    pub season_id: SeasonId,
    pub kind: CompetitionKind,
    pub linked_league_season: SeasonId,
    pub fights: Vec<Fight>,
}

/// Derived completion status across a league season and its two cups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    pub all_completed: bool,
    pub league_completed: bool,
    pub cc_completed: bool,
    pub ic_completed: bool,
    /// Operator-readable summary naming exactly the pending competitions
    pub reason: String,
}

impl CompletionReport {
    /// Build a report from the three flags, deriving `all_completed` and
    /// the reason string.
    pub fn from_flags(league: bool, cc: bool, ic: bool) -> Self {
        let all_completed = league && cc && ic;
        let reason = if all_completed {
            "league, Champions Cup and Invicta Cup are all complete".to_string()
        } else {
            let mut pending = Vec::new();
            if !league {
                pending.push("league");
            }
            if !cc {
                pending.push("Champions Cup");
            }
            if !ic {
                pending.push("Invicta Cup");
            }
            format!("waiting on: {}", pending.join(", "))
        };

        Self {
            all_completed,
            league_completed: league,
            cc_completed: cc,
            ic_completed: ic,
            reason,
        }
    }
}
