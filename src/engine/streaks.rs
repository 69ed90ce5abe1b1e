//! Streak and head-to-head replay.
//!
//! Replays a full fight sequence from an empty state and folds each decided
//! fight into per-fighter streak records and opponent history. The fold is
//! not commutative: fights must arrive in strict chronological order
//! (season, division, round, intra-round sequence ascending). Out-of-order
//! input is rejected rather than silently corrupting streak continuity.
//!
//! There is no incremental path; regenerating from the first season forward
//! is the only supported mode.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    Fight, FightDetail, FighterId, FighterStreakState, StreakContext, StreakKind, StreakRecord,
};

use super::EngineError;

/// Replay `fights` into per-fighter streak and history state.
///
/// Undecided fights are skipped. Fighters never involved in a decided fight
/// do not appear in the output.
pub fn replay(fights: &[Fight]) -> Result<BTreeMap<FighterId, FighterStreakState>, EngineError> {
    let mut states: BTreeMap<FighterId, FighterStreakState> = BTreeMap::new();
    let mut last_key: Option<(u32, u32, u32, u32)> = None;
    let mut processed = 0usize;

    for fight in fights {
        let key = fight.chronological_key();
        if let Some(prev) = last_key {
            if key < prev {
                return Err(EngineError::DataIntegrity(format!(
                    "fight {} out of chronological order (key {:?} after {:?})",
                    fight.identifier, key, prev
                )));
            }
        }
        last_key = Some(key);

        let winner = match &fight.winner {
            Some(w) => w.clone(),
            None => continue,
        };
        let loser = match fight.loser() {
            Some(l) => l.clone(),
            None => {
                return Err(EngineError::DataIntegrity(format!(
                    "fight {} winner {} is not a participant",
                    fight.identifier, winner
                )))
            }
        };

        let context = StreakContext {
            season: fight.season,
            division: fight.division,
            round: fight.round,
        };

        {
            let state = states.entry(winner.clone()).or_default();
            apply_result(state, StreakKind::Win, &context, &loser);
            record_history(state, &loser, fight, true);
        }
        {
            let state = states.entry(loser.clone()).or_default();
            apply_result(state, StreakKind::Lose, &context, &winner);
            record_history(state, &winner, fight, false);
        }

        processed += 1;
    }

    debug!("Replayed {} decided fights into {} fighter states", processed, states.len());
    Ok(states)
}

/// Extend a matching active streak, or close the opposing one and open a
/// fresh streak of count 1.
fn apply_result(
    state: &mut FighterStreakState,
    kind: StreakKind,
    context: &StreakContext,
    opponent: &FighterId,
) {
    match state.active_streak_mut() {
        Some(active) if active.kind == kind => {
            active.extend(opponent.clone());
            return;
        }
        Some(active) => active.close(context.clone()),
        None => {}
    }

    state
        .streaks
        .push(StreakRecord::open(kind, context.clone(), opponent.clone()));
}

fn record_history(
    state: &mut FighterStreakState,
    opponent: &FighterId,
    fight: &Fight,
    won: bool,
) {
    let detail = FightDetail {
        competition_id: fight.competition_id.clone(),
        season: fight.season,
        division: fight.division,
        round: fight.round,
        fight_id: fight.id.clone(),
        is_winner: won,
    };
    state.against_mut(opponent).record(won, detail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;

    fn decided(round: u32, seq: u32, winner: &str, loser: &str) -> Fight {
        Fight::new(
            EntityId::from("league"),
            1,
            1,
            round,
            format!("R{:02}-F{:02}", round, seq),
            EntityId::from(winner),
            EntityId::from(loser),
        )
        .with_winner(EntityId::from(winner))
    }

    fn pending(round: u32, seq: u32, a: &str, b: &str) -> Fight {
        Fight::new(
            EntityId::from("league"),
            1,
            1,
            round,
            format!("R{:02}-F{:02}", round, seq),
            EntityId::from(a),
            EntityId::from(b),
        )
    }

    #[test]
    fn test_single_fight_opens_both_streaks() {
        let states = replay(&[decided(1, 1, "alpha", "bravo")]).unwrap();

        let alpha = &states[&EntityId::from("alpha")];
        let win = alpha.active_streak().unwrap();
        assert_eq!(win.kind, StreakKind::Win);
        assert_eq!(win.count, 1);
        assert_eq!(win.opponents, vec![EntityId::from("bravo")]);

        let bravo = &states[&EntityId::from("bravo")];
        let lose = bravo.active_streak().unwrap();
        assert_eq!(lose.kind, StreakKind::Lose);
        assert_eq!(lose.count, 1);
    }

    #[test]
    fn test_win_streak_extends() {
        let states = replay(&[
            decided(1, 1, "alpha", "bravo"),
            decided(2, 1, "alpha", "charlie"),
            decided(3, 1, "alpha", "delta"),
        ])
        .unwrap();

        let alpha = &states[&EntityId::from("alpha")];
        assert_eq!(alpha.streaks.len(), 1);
        let streak = alpha.active_streak().unwrap();
        assert_eq!(streak.count, 3);
        assert_eq!(
            streak.opponents,
            vec![
                EntityId::from("bravo"),
                EntityId::from("charlie"),
                EntityId::from("delta")
            ]
        );
    }

    #[test]
    fn test_loss_closes_win_streak_and_opens_lose_streak() {
        let states = replay(&[
            decided(1, 1, "alpha", "bravo"),
            decided(2, 1, "alpha", "charlie"),
            decided(3, 1, "alpha", "delta"),
            decided(4, 1, "echo", "alpha"),
        ])
        .unwrap();

        let alpha = &states[&EntityId::from("alpha")];
        assert_eq!(alpha.streaks.len(), 2);

        let closed = &alpha.streaks[0];
        assert_eq!(closed.kind, StreakKind::Win);
        assert_eq!(closed.count, 3);
        assert!(!closed.active);
        assert_eq!(
            closed.end,
            Some(StreakContext {
                season: 1,
                division: 1,
                round: 4
            })
        );

        let opened = alpha.active_streak().unwrap();
        assert_eq!(opened.kind, StreakKind::Lose);
        assert_eq!(opened.count, 1);
    }

    #[test]
    fn test_streak_exclusivity_over_any_prefix() {
        let fights = vec![
            decided(1, 1, "alpha", "bravo"),
            decided(1, 2, "charlie", "delta"),
            decided(2, 1, "bravo", "alpha"),
            decided(2, 2, "delta", "charlie"),
            decided(3, 1, "alpha", "bravo"),
            decided(3, 2, "charlie", "delta"),
        ];

        for prefix_len in 1..=fights.len() {
            let states = replay(&fights[..prefix_len]).unwrap();
            for (fighter, state) in &states {
                let active = state.streaks.iter().filter(|s| s.active).count();
                assert!(
                    active <= 1,
                    "fighter {} has {} active streaks after {} fights",
                    fighter,
                    active,
                    prefix_len
                );
            }
        }
    }

    #[test]
    fn test_opponent_history_symmetric() {
        let states = replay(&[
            decided(1, 1, "alpha", "bravo"),
            decided(2, 1, "bravo", "alpha"),
            decided(3, 1, "alpha", "bravo"),
        ])
        .unwrap();

        let a_vs_b = states[&EntityId::from("alpha")]
            .against(&EntityId::from("bravo"))
            .unwrap();
        let b_vs_a = states[&EntityId::from("bravo")]
            .against(&EntityId::from("alpha"))
            .unwrap();

        assert_eq!(a_vs_b.total_fights, 3);
        assert_eq!(b_vs_a.total_fights, 3);
        assert_eq!(a_vs_b.total_wins, b_vs_a.total_losses);
        assert_eq!(a_vs_b.total_losses, b_vs_a.total_wins);
        assert_eq!(a_vs_b.win_percentage, 67);
        assert_eq!(b_vs_a.win_percentage, 33);
    }

    #[test]
    fn test_history_details_carry_context() {
        let states = replay(&[decided(5, 2, "alpha", "bravo")]).unwrap();

        let entry = states[&EntityId::from("alpha")]
            .against(&EntityId::from("bravo"))
            .unwrap();
        assert_eq!(entry.details.len(), 1);
        let detail = &entry.details[0];
        assert_eq!(detail.season, 1);
        assert_eq!(detail.division, 1);
        assert_eq!(detail.round, 5);
        assert!(detail.is_winner);

        let loser_detail = &states[&EntityId::from("bravo")]
            .against(&EntityId::from("alpha"))
            .unwrap()
            .details[0];
        assert!(!loser_detail.is_winner);
        assert_eq!(loser_detail.fight_id, detail.fight_id);
    }

    #[test]
    fn test_undecided_fights_skipped() {
        let states = replay(&[
            decided(1, 1, "alpha", "bravo"),
            pending(1, 2, "charlie", "delta"),
        ])
        .unwrap();

        assert_eq!(states.len(), 2);
        assert!(!states.contains_key(&EntityId::from("charlie")));
    }

    #[test]
    fn test_uninvolved_fighters_untouched() {
        let states = replay(&[
            decided(1, 1, "alpha", "bravo"),
            decided(2, 1, "charlie", "delta"),
        ])
        .unwrap();

        let alpha = &states[&EntityId::from("alpha")];
        assert_eq!(alpha.streaks.len(), 1);
        assert_eq!(alpha.active_streak().unwrap().count, 1);
        assert_eq!(alpha.opponent_history.len(), 1);
    }

    #[test]
    fn test_out_of_order_input_rejected() {
        let err = replay(&[
            decided(2, 1, "alpha", "bravo"),
            decided(1, 1, "charlie", "delta"),
        ])
        .unwrap_err();

        assert!(matches!(err, EngineError::DataIntegrity(_)));
    }

    #[test]
    fn test_replay_from_empty_is_idempotent() {
        let fights = vec![
            decided(1, 1, "alpha", "bravo"),
            decided(2, 1, "bravo", "alpha"),
        ];

        let first = replay(&fights).unwrap();
        let second = replay(&fights).unwrap();

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_streaks_span_seasons() {
        let mut s2 = decided(1, 1, "alpha", "charlie");
        s2.season = 2;
        s2.id = EntityId::from("s2-fight");

        let states = replay(&[decided(1, 1, "alpha", "bravo"), s2]).unwrap();
        let alpha = &states[&EntityId::from("alpha")];
        assert_eq!(alpha.active_streak().unwrap().count, 2);
    }
}
