//! Streak and head-to-head history records.

use serde::{Deserialize, Serialize};

use super::{CompetitionId, FightId, FighterId};

/// Whether a streak is a run of wins or of losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakKind {
    Win,
    Lose,
}

/// Where (in competition time) a streak started or ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakContext {
    pub season: u32,
    pub division: u32,
    pub round: u32,
}

/// A contiguous run of wins or losses for one fighter.
///
/// Mutated in place while `active`, then frozen when broken (`active` set
/// false and `end` recorded). A fighter has at most one active streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakRecord {
    pub kind: StreakKind,
    pub start: StreakContext,
    pub end: Option<StreakContext>,
    pub count: u32,
    pub active: bool,
    /// Opponents faced during the streak, in order
    pub opponents: Vec<FighterId>,
}

impl StreakRecord {
    /// Open a new streak of count 1 against the first opponent.
    pub fn open(kind: StreakKind, start: StreakContext, opponent: FighterId) -> Self {
        Self {
            kind,
            start,
            end: None,
            count: 1,
            active: true,
            opponents: vec![opponent],
        }
    }

    /// Extend an active streak by one fight.
    pub fn extend(&mut self, opponent: FighterId) {
        self.count += 1;
        self.opponents.push(opponent);
    }

    /// Freeze the streak at the given context.
    pub fn close(&mut self, end: StreakContext) {
        self.active = false;
        self.end = Some(end);
    }
}

/// One fight's contribution to a head-to-head record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightDetail {
    pub competition_id: CompetitionId,
    pub season: u32,
    pub division: u32,
    pub round: u32,
    pub fight_id: FightId,
    pub is_winner: bool,
}

/// Aggregate head-to-head record against one specific opponent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentHistoryEntry {
    pub opponent_id: FighterId,
    pub total_fights: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    /// Rounded percentage, 0..=100
    pub win_percentage: u32,
    /// Per-fight context, in chronological order
    pub details: Vec<FightDetail>,
}

impl OpponentHistoryEntry {
    /// An empty record against the given opponent.
    pub fn new(opponent_id: FighterId) -> Self {
        Self {
            opponent_id,
            total_fights: 0,
            total_wins: 0,
            total_losses: 0,
            win_percentage: 0,
            details: Vec::new(),
        }
    }

    /// Fold one decided fight into the record.
    pub fn record(&mut self, won: bool, detail: FightDetail) {
        self.total_fights += 1;
        if won {
            self.total_wins += 1;
        } else {
            self.total_losses += 1;
        }
        self.win_percentage =
            ((self.total_wins as f64 / self.total_fights as f64) * 100.0).round() as u32;
        self.details.push(detail);
    }
}

/// Full replay output for one fighter: every streak (frozen and active)
/// plus head-to-head history against every opponent faced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FighterStreakState {
    pub streaks: Vec<StreakRecord>,
    pub opponent_history: Vec<OpponentHistoryEntry>,
}

impl FighterStreakState {
    /// The currently active streak, if any.
    pub fn active_streak(&self) -> Option<&StreakRecord> {
        self.streaks.iter().find(|s| s.active)
    }

    pub(crate) fn active_streak_mut(&mut self) -> Option<&mut StreakRecord> {
        self.streaks.iter_mut().find(|s| s.active)
    }

    /// Longest win streak ever recorded, active or closed.
    pub fn longest_win_streak(&self) -> u32 {
        self.streaks
            .iter()
            .filter(|s| s.kind == StreakKind::Win)
            .map(|s| s.count)
            .max()
            .unwrap_or(0)
    }

    /// Total fights across all opponents.
    pub fn total_fights(&self) -> u32 {
        self.opponent_history.iter().map(|h| h.total_fights).sum()
    }

    /// Total wins across all opponents.
    pub fn total_wins(&self) -> u32 {
        self.opponent_history.iter().map(|h| h.total_wins).sum()
    }

    /// Head-to-head record against one opponent.
    pub fn against(&self, opponent: &FighterId) -> Option<&OpponentHistoryEntry> {
        self.opponent_history
            .iter()
            .find(|h| h.opponent_id == *opponent)
    }

    pub(crate) fn against_mut(&mut self, opponent: &FighterId) -> &mut OpponentHistoryEntry {
        if let Some(idx) = self
            .opponent_history
            .iter()
            .position(|h| h.opponent_id == *opponent)
        {
            &mut self.opponent_history[idx]
        } else {
            self.opponent_history
                .push(OpponentHistoryEntry::new(opponent.clone()));
            self.opponent_history.last_mut().expect("pushed above")
        }
    }
}
