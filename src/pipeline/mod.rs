//! Trigger pipeline.
//!
//! Wires the pure engine computations to the persistence seams. Triggers
//! arrive as explicit events rather than in-line calls between subsystems,
//! so each path stays testable in isolation:
//!
//! - `FightDecided` folds one fight into its division's standings
//! - `SeasonDataChanged` replays the whole ledger into fresh streak state
//! - `CupFightDecided` runs the completion check and, when the league and
//!   both cups are done, a global ranking recalculation
//!
//! Standings writes are serialized per division (snapshot N+1 depends on
//! snapshot N); the ranking recalculation is a critical section guarded by
//! a single lock so two near-simultaneous cup completions cannot race two
//! snapshots into being current.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::engine::{
    self, check_completion, compute_standings, league_season_complete, EngineError,
};
use crate::models::{
    CompetitionId, CompetitionKind, CompletionReport, DivisionView, FightId, FighterId,
    FighterResume, GlobalRankSnapshot, RankPointer, StandingsSnapshot,
};
use crate::storage::{FightSource, SnapshotStore, StorageError};

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("fight {0} not found in ledger")]
    FightNotFound(FightId),

    #[error("no league season {1} registered for competition {0}")]
    SeasonNotFound(CompetitionId, u32),
}

/// A derived-state trigger.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    FightDecided {
        competition_id: CompetitionId,
        season: u32,
        division: u32,
        fight_id: FightId,
    },
    SeasonDataChanged {
        competition_id: CompetitionId,
    },
    CupFightDecided {
        cup_competition_id: CompetitionId,
        season: u32,
        fight_id: FightId,
    },
}

type DivisionKey = (String, u32, u32);

/// The engine's orchestration layer.
pub struct Pipeline {
    source: Arc<dyn FightSource>,
    store: Arc<dyn SnapshotStore>,
    scoring: ScoringConfig,
    /// The league competition the cup completion gate reports against
    league_competition: CompetitionId,
    division_locks: Mutex<HashMap<DivisionKey, Arc<Mutex<()>>>>,
    ranking_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn FightSource>,
        store: Arc<dyn SnapshotStore>,
        scoring: ScoringConfig,
        league_competition: CompetitionId,
    ) -> Self {
        Self {
            source,
            store,
            scoring,
            league_competition,
            division_locks: Mutex::new(HashMap::new()),
            ranking_lock: Mutex::new(()),
        }
    }

    /// Dispatch one event.
    pub async fn handle(&self, event: EngineEvent) -> Result<(), PipelineError> {
        match event {
            EngineEvent::FightDecided {
                competition_id,
                season,
                division,
                fight_id,
            } => {
                self.on_fight_decided(&competition_id, season, division, &fight_id)
                    .await?;
            }
            EngineEvent::SeasonDataChanged { competition_id } => {
                self.on_season_data_changed(&competition_id).await?;
            }
            EngineEvent::CupFightDecided {
                cup_competition_id,
                season,
                fight_id,
            } => {
                self.on_cup_fight_decided(&cup_competition_id, season, &fight_id)
                    .await?;
            }
        }
        Ok(())
    }

    /// Consume events until the channel closes. Failures abort only the
    /// event that raised them.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle(event).await {
                warn!("Pipeline event failed: {}", e);
            }
        }
    }

    async fn division_lock(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Arc<Mutex<()>> {
        let mut locks = self.division_locks.lock().await;
        locks
            .entry((competition_id.as_str().to_string(), season, division))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fold one decided fight into its division's standings.
    pub async fn on_fight_decided(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
        fight_id: &FightId,
    ) -> Result<StandingsSnapshot, PipelineError> {
        let lock = self.division_lock(competition_id, season, division).await;
        let _guard = lock.lock().await;

        let fights = self
            .source
            .list_fights(competition_id, season, Some(division))
            .await?;
        let fight = fights
            .iter()
            .find(|f| f.id == *fight_id)
            .ok_or_else(|| PipelineError::FightNotFound(fight_id.clone()))?;

        let roster = self
            .source
            .fighter_roster(competition_id, season, division)
            .await?;
        let previous = self
            .store
            .latest_standings_snapshot(competition_id, season, division)
            .await?;

        let snapshot = compute_standings(
            previous.as_ref(),
            fight,
            &roster,
            self.scoring.points_per_win,
        )?;
        self.store.save_standings_snapshot(&snapshot).await?;

        info!(
            competition = %competition_id,
            season,
            division,
            fight = %fight.identifier,
            "standings snapshot saved"
        );
        Ok(snapshot)
    }

    /// Rebuild streak and head-to-head state from the whole ledger.
    ///
    /// The replay always regenerates from the first season forward, across
    /// every competition; `competition_id` names the trigger for logging.
    /// The new state is written as a fresh generation, so readers never see
    /// a half-replayed mix.
    pub async fn on_season_data_changed(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<usize, PipelineError> {
        let fights = self.source.all_fights().await?;
        let states = engine::replay(&fights)?;
        let count = states.len();
        self.store.save_streak_states(&states).await?;

        info!(
            trigger = %competition_id,
            fights = fights.len(),
            fighters = count,
            "streak state rebuilt"
        );
        Ok(count)
    }

    /// Check the completion gate for the season a cup fight belongs to,
    /// and recalculate the global ranking when everything is done.
    pub async fn on_cup_fight_decided(
        &self,
        cup_competition_id: &CompetitionId,
        season: u32,
        fight_id: &FightId,
    ) -> Result<CompletionReport, PipelineError> {
        let league = self
            .source
            .league_season(&self.league_competition, season)
            .await?
            .ok_or_else(|| {
                PipelineError::SeasonNotFound(self.league_competition.clone(), season)
            })?;

        let cc = self
            .source
            .cup_season(CompetitionKind::ChampionsCup, &league.season_id)
            .await?;
        let ic = self
            .source
            .cup_season(CompetitionKind::InvictaCup, &league.season_id)
            .await?;

        let report = check_completion(&league, cc.as_ref(), ic.as_ref());
        info!(
            cup = %cup_competition_id,
            fight = %fight_id,
            season,
            all_completed = report.all_completed,
            reason = %report.reason,
            "completion gate"
        );

        if report.all_completed {
            self.recalculate_rankings().await?;
            // The season takes no more standings writes; drop its locks
            // so the keyed map does not grow without bound.
            self.evict_division_locks(&self.league_competition, season)
                .await;
        }
        Ok(report)
    }

    async fn evict_division_locks(&self, competition_id: &CompetitionId, season: u32) {
        let mut locks = self.division_locks.lock().await;
        locks.retain(|(comp, s, _), _| !(comp == competition_id.as_str() && *s == season));
    }

    /// Full ranking pass over every fighter: score, rank, promote a new
    /// snapshot, rewrite each fighter's denormalized pointer.
    ///
    /// Serialized: concurrent invocations queue behind the ranking lock.
    pub async fn recalculate_rankings(&self) -> Result<GlobalRankSnapshot, PipelineError> {
        let _guard = self.ranking_lock.lock().await;

        let resumes = self.build_resumes().await?;
        let snapshot = engine::recalculate(&resumes, &self.scoring.weights);
        let promoted = self.store.promote_rank_snapshot(snapshot).await?;

        let pointers: BTreeMap<FighterId, RankPointer> = promoted
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.fighter_id.clone(),
                    RankPointer {
                        rank: entry.rank,
                        score: entry.score,
                        snapshot_id: promoted.id,
                    },
                )
            })
            .collect();
        self.store.update_fighter_rank_pointers(&pointers).await?;

        info!(
            snapshot = %promoted.id,
            fighters = promoted.entries.len(),
            "global ranking promoted"
        );
        Ok(promoted)
    }

    /// Assemble every fighter's career resume from the ledger, the
    /// standings snapshots and the streak state.
    async fn build_resumes(&self) -> Result<Vec<FighterResume>, PipelineError> {
        let mut resumes: BTreeMap<FighterId, FighterResume> = self
            .source
            .list_fighters()
            .await?
            .into_iter()
            .map(|f| (f.id.clone(), FighterResume::new(f.id)))
            .collect();

        fn resume_of<'a>(
            resumes: &'a mut BTreeMap<FighterId, FighterResume>,
            id: &FighterId,
        ) -> &'a mut FighterResume {
            resumes
                .entry(id.clone())
                .or_insert_with(|| FighterResume::new(id.clone()))
        }

        for meta in self.source.seasons().await? {
            match meta.kind {
                CompetitionKind::League => {
                    for division_meta in &meta.divisions {
                        let roster = self
                            .source
                            .fighter_roster(&meta.competition_id, meta.season, division_meta.division)
                            .await?;
                        for id in &roster {
                            let resume = resume_of(&mut resumes, id);
                            // Only divisions 1-3 carry ranking weight.
                            match division_meta.division {
                                1 => resume.division1_appearances += 1,
                                2 => resume.division2_appearances += 1,
                                3 => resume.division3_appearances += 1,
                                _ => {}
                            }
                        }
                    }

                    // The league title goes to whoever tops division 1 once
                    // the season is fully decided.
                    let view = self
                        .source
                        .league_season(&meta.competition_id, meta.season)
                        .await?
                        .filter(league_season_complete);
                    if let Some(view) = view {
                        let champion = match self
                            .store
                            .latest_standings_snapshot(&meta.competition_id, meta.season, 1)
                            .await?
                        {
                            Some(snapshot) => {
                                snapshot.leader().map(|l| l.fighter_id.clone())
                            }
                            // The standings trigger may never have fired for
                            // this season; fold the decided fights directly.
                            None => match view.divisions.iter().find(|d| d.division == 1) {
                                Some(division) => {
                                    self.division_leader_from_fights(
                                        &meta.competition_id,
                                        meta.season,
                                        division,
                                    )
                                    .await?
                                }
                                None => None,
                            },
                        };
                        if let Some(champion) = champion {
                            resume_of(&mut resumes, &champion).league_titles += 1;
                        }
                    }
                }
                CompetitionKind::ChampionsCup | CompetitionKind::InvictaCup => {
                    let fights = self
                        .source
                        .list_fights(&meta.competition_id, meta.season, None)
                        .await?;

                    let mut participants: BTreeSet<FighterId> = BTreeSet::new();
                    for fight in &fights {
                        participants.insert(fight.fighter1.clone());
                        participants.insert(fight.fighter2.clone());
                    }
                    for id in &participants {
                        let resume = resume_of(&mut resumes, id);
                        match meta.kind {
                            CompetitionKind::ChampionsCup => {
                                resume.champions_cup_appearances += 1
                            }
                            CompetitionKind::InvictaCup => resume.invicta_cup_appearances += 1,
                            CompetitionKind::League => unreachable!(),
                        }
                    }

                    // The cup title goes to the winner of the last
                    // terminal-stage fight, once every such fight is decided.
                    let terminal: Vec<_> =
                        fights.iter().filter(|f| f.is_terminal_stage()).collect();
                    let champion = if !terminal.is_empty()
                        && terminal.iter().all(|f| f.is_decided())
                    {
                        terminal.last().and_then(|f| f.winner.clone())
                    } else {
                        None
                    };
                    if let Some(champion) = champion {
                        let resume = resume_of(&mut resumes, &champion);
                        match meta.kind {
                            CompetitionKind::ChampionsCup => resume.champions_cup_titles += 1,
                            CompetitionKind::InvictaCup => resume.invicta_cup_titles += 1,
                            CompetitionKind::League => unreachable!(),
                        }
                    }
                }
            }
        }

        for (fighter_id, state) in self.store.load_streak_states().await? {
            let resume = resume_of(&mut resumes, &fighter_id);
            resume.total_wins = state.total_wins();
            resume.total_fights = state.total_fights();
            resume.longest_win_streak = state.longest_win_streak();
        }

        Ok(resumes.into_values().collect())
    }

    /// Fold a division's decided fights into standings and name the leader.
    /// Used when a season finished without any persisted snapshot for the
    /// division.
    async fn division_leader_from_fights(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: &DivisionView,
    ) -> Result<Option<FighterId>, PipelineError> {
        let roster = self
            .source
            .fighter_roster(competition_id, season, division.division)
            .await?;
        let mut current: Option<StandingsSnapshot> = None;
        for fight in division.fights.iter().filter(|f| f.is_decided()) {
            current = Some(compute_standings(
                current.as_ref(),
                fight,
                &roster,
                self.scoring.points_per_win,
            )?);
        }
        Ok(current
            .as_ref()
            .and_then(|s| s.leader())
            .map(|l| l.fighter_id.clone()))
    }
}
