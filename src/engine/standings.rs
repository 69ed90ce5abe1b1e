//! Standings computation.
//!
//! Folds one decided fight into the division's cumulative standings. Only
//! the two participants' rows change; everyone else is carried forward, so
//! the update is O(1) amortized plus the re-sort.

use std::collections::BTreeMap;

use crate::models::{Fight, FighterId, FighterStanding, StandingsSnapshot};

use super::EngineError;

/// Compute the standings snapshot that follows `previous` after `fight`.
///
/// `previous` is the snapshot immediately preceding this fight in the same
/// division, or `None` at the start of a season. `roster` is the full
/// division roster; fighters with no fights yet still get a row.
///
/// Tie-break within equal points: wins descending, then fights count
/// ascending (fewer fights is better), then fighter id ascending.
pub fn compute_standings(
    previous: Option<&StandingsSnapshot>,
    fight: &Fight,
    roster: &[FighterId],
    points_per_win: u32,
) -> Result<StandingsSnapshot, EngineError> {
    let winner = fight.winner.as_ref().ok_or_else(|| {
        EngineError::InvalidState(format!("fight {} has no winner yet", fight.identifier))
    })?;
    let loser = fight.loser().ok_or_else(|| {
        EngineError::DataIntegrity(format!(
            "fight {} winner {} is not a participant",
            fight.identifier, winner
        ))
    })?;

    for participant in [&fight.fighter1, &fight.fighter2] {
        if !roster.contains(participant) {
            return Err(EngineError::DataIntegrity(format!(
                "fighter {} in fight {} is absent from the division roster",
                participant, fight.identifier
            )));
        }
    }

    // Carry rows forward; the roster is authoritative for who appears.
    let mut rows: BTreeMap<FighterId, FighterStanding> = roster
        .iter()
        .map(|id| {
            let row = previous
                .and_then(|p| p.standing_of(id))
                .cloned()
                .unwrap_or_else(|| FighterStanding::baseline(id.clone()));
            (id.clone(), row)
        })
        .collect();

    let loser = loser.clone();
    for (fighter, won) in [(winner.clone(), true), (loser, false)] {
        let row = rows.get_mut(&fighter).expect("participant checked above");
        row.fights_count += 1;
        if won {
            row.wins += 1;
        }
        row.points = row.wins * points_per_win;
    }

    let mut sorted: Vec<FighterStanding> = rows.into_values().collect();
    sorted.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.fights_count.cmp(&b.fights_count))
            .then_with(|| a.fighter_id.cmp(&b.fighter_id))
    });
    for (i, row) in sorted.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }

    Ok(StandingsSnapshot::new(
        fight.competition_id.clone(),
        fight.season,
        fight.division,
        fight.round,
        fight.identifier.clone(),
        sorted,
    ))
}
