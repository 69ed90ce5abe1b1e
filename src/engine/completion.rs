//! Season completion detection.
//!
//! A league season is complete when every division's final round has all
//! fights decided. A cup season is complete when its terminal-stage fights
//! exist and are all decided. "Not yet complete" is the normal steady state
//! for most of a season's lifetime, never an error.

use tracing::debug;

use crate::models::{CompletionReport, CupSeasonView, LeagueSeasonView};

/// Check a league season and its two linked cup seasons for completion.
///
/// A cup season that has not been created yet (`None`) counts as
/// incomplete; cups are spawned partway through the league season.
pub fn check_completion(
    league: &LeagueSeasonView,
    champions_cup: Option<&CupSeasonView>,
    invicta_cup: Option<&CupSeasonView>,
) -> CompletionReport {
    let league_completed = league_season_complete(league);
    let cc_completed = champions_cup.map(cup_season_complete).unwrap_or(false);
    let ic_completed = invicta_cup.map(cup_season_complete).unwrap_or(false);

    let report = CompletionReport::from_flags(league_completed, cc_completed, ic_completed);
    debug!(
        season = league.season,
        all = report.all_completed,
        reason = %report.reason,
        "completion check"
    );
    report
}

/// Whether every division's final round is fully decided.
pub fn league_season_complete(league: &LeagueSeasonView) -> bool {
    if league.divisions.is_empty() {
        return false;
    }
    league.divisions.iter().all(|division| {
        let final_round: Vec<_> = division
            .fights
            .iter()
            .filter(|f| f.round == division.total_rounds)
            .collect();
        !final_round.is_empty() && final_round.iter().all(|f| f.is_decided())
    })
}

/// Whether the cup's terminal-stage fights exist and are all decided.
pub fn cup_season_complete(cup: &CupSeasonView) -> bool {
    let terminal: Vec<_> = cup
        .fights
        .iter()
        .filter(|f| f.is_terminal_stage())
        .collect();
    !terminal.is_empty() && terminal.iter().all(|f| f.is_decided())
}
