//! Global ranking computation.
//!
//! A full batch pass over every fighter's career resume. There is no
//! incremental update path; each run produces a whole new snapshot.

use tracing::info;

use crate::models::{FighterResume, GlobalRankSnapshot, RankEntry};

/// Scoring weights. The defaults are the fixed production constants;
/// they live in configuration for documentation, not for tuning per run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreWeights {
    pub win_percentage_divisor: f64,
    pub league_title: f64,
    pub champions_cup_title: f64,
    pub invicta_cup_title: f64,
    pub champions_cup_appearance: f64,
    pub invicta_cup_appearance: f64,
    pub division1_appearance: f64,
    pub division2_appearance: f64,
    pub division3_appearance: f64,
    pub win_streak_divisor: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            win_percentage_divisor: 10.0,
            league_title: 5.0,
            champions_cup_title: 4.0,
            invicta_cup_title: 4.0,
            champions_cup_appearance: 3.0,
            invicta_cup_appearance: 2.0,
            division1_appearance: 1.0,
            division2_appearance: 0.75,
            division3_appearance: 0.5,
            win_streak_divisor: 5.0,
        }
    }
}

/// Score one fighter's resume. A fighter with no recorded fights scores
/// purely on appearance and title terms.
pub fn score_fighter(resume: &FighterResume, weights: &ScoreWeights) -> f64 {
    resume.overall_win_percentage() / weights.win_percentage_divisor
        + resume.league_titles as f64 * weights.league_title
        + resume.champions_cup_titles as f64 * weights.champions_cup_title
        + resume.invicta_cup_titles as f64 * weights.invicta_cup_title
        + resume.champions_cup_appearances as f64 * weights.champions_cup_appearance
        + resume.invicta_cup_appearances as f64 * weights.invicta_cup_appearance
        + resume.division1_appearances as f64 * weights.division1_appearance
        + resume.division2_appearances as f64 * weights.division2_appearance
        + resume.division3_appearances as f64 * weights.division3_appearance
        + resume.longest_win_streak as f64 / weights.win_streak_divisor
}

/// Score and rank every fighter, producing a new (not yet current)
/// snapshot with dense ranks 1..N.
///
/// Ties on score break by overall win percentage descending, then total
/// titles descending, then fighter id ascending, so the ordering never
/// depends on input order.
pub fn recalculate(resumes: &[FighterResume], weights: &ScoreWeights) -> GlobalRankSnapshot {
    let mut scored: Vec<(&FighterResume, f64)> = resumes
        .iter()
        .map(|r| (r, score_fighter(r, weights)))
        .collect();

    scored.sort_by(|(ra, sa), (rb, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                rb.overall_win_percentage()
                    .partial_cmp(&ra.overall_win_percentage())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| rb.total_titles().cmp(&ra.total_titles()))
            .then_with(|| ra.fighter_id.cmp(&rb.fighter_id))
    });

    let entries: Vec<RankEntry> = scored
        .iter()
        .enumerate()
        .map(|(i, (resume, score))| RankEntry {
            fighter_id: resume.fighter_id.clone(),
            score: *score,
            rank: i as u32 + 1,
            titles: resume.total_titles(),
            cup_appearances: resume.champions_cup_appearances + resume.invicta_cup_appearances,
            league_appearances: resume.division1_appearances
                + resume.division2_appearances
                + resume.division3_appearances,
        })
        .collect();

    info!("Recalculated global ranking for {} fighters", entries.len());
    GlobalRankSnapshot::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;

    fn resume(id: &str) -> FighterResume {
        FighterResume::new(EntityId::from(id))
    }

    #[test]
    fn test_score_formula_reference_value() {
        // 60% win rate, 1 league title, 2 CC appearances, 3 D1 appearances,
        // longest win streak 10: 6 + 5 + 6 + 3 + 2 = 22
        let mut r = resume("alpha");
        r.total_wins = 6;
        r.total_fights = 10;
        r.league_titles = 1;
        r.champions_cup_appearances = 2;
        r.division1_appearances = 3;
        r.longest_win_streak = 10;

        let score = score_fighter(&r, &ScoreWeights::default());
        assert!((score - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_zero_fights_no_division_by_zero() {
        let mut r = resume("alpha");
        r.champions_cup_appearances = 1;

        let score = score_fighter(&r, &ScoreWeights::default());
        assert!((score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_blank_resume_is_zero() {
        let score = score_fighter(&resume("alpha"), &ScoreWeights::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_recalculate_orders_by_score() {
        let mut strong = resume("strong");
        strong.league_titles = 2;
        let mut weak = resume("weak");
        weak.invicta_cup_appearances = 1;

        let snapshot = recalculate(&[weak, strong], &ScoreWeights::default());

        assert_eq!(snapshot.entries[0].fighter_id, EntityId::from("strong"));
        assert_eq!(snapshot.entries[0].rank, 1);
        assert_eq!(snapshot.entries[1].fighter_id, EntityId::from("weak"));
        assert_eq!(snapshot.entries[1].rank, 2);
    }

    #[test]
    fn test_recalculate_ranks_dense() {
        let resumes: Vec<FighterResume> =
            ["a", "b", "c", "d"].iter().map(|id| resume(id)).collect();
        let snapshot = recalculate(&resumes, &ScoreWeights::default());

        let ranks: Vec<u32> = snapshot.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tie_break_independent_of_input_order() {
        // Equal scores: one league title vs one CC+IC-free combination
        // engineered to the same total. Win percentage breaks the tie.
        let mut a = resume("aaa");
        a.league_titles = 1;
        a.total_wins = 8;
        a.total_fights = 10; // 80% -> 8 + 5 = 13

        let mut b = resume("bbb");
        b.league_titles = 1;
        b.total_wins = 4;
        b.total_fights = 5; // 80% -> 8 + 5 = 13

        let forward = recalculate(&[a.clone(), b.clone()], &ScoreWeights::default());
        let reversed = recalculate(&[b, a], &ScoreWeights::default());

        // Same score, same win%, same titles: id ascending wins
        assert_eq!(forward.entries[0].fighter_id, EntityId::from("aaa"));
        assert_eq!(reversed.entries[0].fighter_id, EntityId::from("aaa"));
    }

    #[test]
    fn test_tie_break_prefers_higher_win_percentage() {
        let mut a = resume("aaa");
        a.champions_cup_appearances = 2; // 6.0

        let mut b = resume("bbb");
        b.total_wins = 3;
        b.total_fights = 10; // 30% -> 3.0
        b.invicta_cup_appearances = 1;
        b.division1_appearances = 1; // 3.0 + 2.0 + 1.0 = 6.0

        let snapshot = recalculate(&[a, b], &ScoreWeights::default());
        assert_eq!(snapshot.entries[0].fighter_id, EntityId::from("bbb"));
    }

    #[test]
    fn test_entry_aggregates() {
        let mut r = resume("alpha");
        r.league_titles = 1;
        r.invicta_cup_titles = 1;
        r.champions_cup_appearances = 2;
        r.invicta_cup_appearances = 1;
        r.division1_appearances = 2;
        r.division3_appearances = 1;

        let snapshot = recalculate(&[r], &ScoreWeights::default());
        let entry = &snapshot.entries[0];
        assert_eq!(entry.titles, 2);
        assert_eq!(entry.cup_appearances, 3);
        assert_eq!(entry.league_appearances, 3);
    }

    #[test]
    fn test_empty_input() {
        let snapshot = recalculate(&[], &ScoreWeights::default());
        assert!(snapshot.entries.is_empty());
        assert!(!snapshot.is_current);
    }
}
