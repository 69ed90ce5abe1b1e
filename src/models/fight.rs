//! Fight records and fight-identifier parsing.
//!
//! A fight identifier is a short stable token unique within its season and
//! division, e.g. `R03-F02` for the second fight of league round 3, or
//! `FN-F01` for a cup final. The trailing `-F<n>` segment orders fights
//! within a round.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::{CompetitionId, EntityId, FightId, FighterId};

fn seq_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-F(\d+)$").unwrap())
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*-F\d+$").unwrap())
}

/// A single contest between two fighters, pending or decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fight {
    /// Unique identifier (derived from competition + season + division + identifier)
    pub id: FightId,

    /// Stable fight identifier within the season/division (e.g. "R03-F02")
    pub identifier: String,

    /// Competition this fight belongs to
    pub competition_id: CompetitionId,

    /// Season number (1-based)
    pub season: u32,

    /// Division number (1-based; cups use 0)
    pub division: u32,

    /// Round number within the division (1-based)
    pub round: u32,

    /// First fighter
    pub fighter1: FighterId,

    /// Second fighter
    pub fighter2: FighterId,

    /// Winner, None until the fight is decided. Immutable once set.
    pub winner: Option<FighterId>,

    /// Cup stage token (e.g. "QF", "SF", "FN"). None for league fights.
    pub stage: Option<String>,

    /// When the result was recorded
    pub decided_at: Option<DateTime<Utc>>,
}

impl Fight {
    /// Create a new pending fight with auto-generated ID.
    pub fn new(
        competition_id: CompetitionId,
        season: u32,
        division: u32,
        round: u32,
        identifier: String,
        fighter1: FighterId,
        fighter2: FighterId,
    ) -> Self {
        let id = EntityId::generate(&[
            competition_id.as_str(),
            &season.to_string(),
            &division.to_string(),
            &identifier,
        ]);

        Self {
            id,
            identifier,
            competition_id,
            season,
            division,
            round,
            fighter1,
            fighter2,
            winner: None,
            stage: None,
            decided_at: None,
        }
    }

    /// Builder method to set the cup stage token.
    pub fn with_stage(mut self, stage: &str) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    /// Builder method to record the winner.
    pub fn with_winner(mut self, winner: FighterId) -> Self {
        self.winner = Some(winner);
        self.decided_at = Some(Utc::now());
        self
    }

    /// Whether the identifier is well-formed.
    pub fn has_valid_identifier(&self) -> bool {
        identifier_regex().is_match(&self.identifier)
    }

    /// Whether the fight has a recorded winner.
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether the given fighter is one of the two participants.
    pub fn involves(&self, fighter: &FighterId) -> bool {
        self.fighter1 == *fighter || self.fighter2 == *fighter
    }

    /// The loser of a decided fight. None while pending or if the recorded
    /// winner is not a participant.
    pub fn loser(&self) -> Option<&FighterId> {
        match &self.winner {
            Some(w) if *w == self.fighter1 => Some(&self.fighter2),
            Some(w) if *w == self.fighter2 => Some(&self.fighter1),
            _ => None,
        }
    }

    /// Intra-round sequence parsed from the trailing `-F<n>` segment.
    pub fn intra_round_seq(&self) -> u32 {
        seq_regex()
            .captures(&self.identifier)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }

    /// Chronological ordering key: season, division, round, intra-round seq.
    pub fn chronological_key(&self) -> (u32, u32, u32, u32) {
        (self.season, self.division, self.round, self.intra_round_seq())
    }

    /// Whether this is a terminal-stage cup fight (the final).
    /// Matches the stage token "FN" or any stage name containing "FINAL".
    pub fn is_terminal_stage(&self) -> bool {
        match &self.stage {
            Some(stage) => stage == "FN" || stage.to_ascii_uppercase().contains("FINAL"),
            None => false,
        }
    }
}
