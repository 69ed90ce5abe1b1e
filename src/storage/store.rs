//! Fight source and snapshot store seams.
//!
//! The engine consumes and produces plain data records; these traits are
//! the persistence boundary it talks through. `JsonlStore` implements both
//! over the local JSONL data lake.
//!
//! Snapshot currency is modelled as a pointer file, not a flag flipped by
//! two separate writes: promoting a ranking snapshot (or a streak
//! generation) writes the new data and then atomically renames a pointer
//! file over the old one. `is_current` on a loaded snapshot is derived
//! from that pointer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    CompetitionId, CompetitionKind, CupSeasonView, DivisionView, Fight, FighterId,
    FighterStreakState, GlobalRankSnapshot, LeagueSeasonView, RankPointer, Roster, SeasonId,
    SeasonMeta, StandingsSnapshot,
};

use super::{EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};

/// Read access to the fight ledger.
#[async_trait]
pub trait FightSource: Send + Sync {
    /// Every registered fighter.
    async fn list_fighters(&self) -> Result<Vec<crate::models::Fighter>, StorageError>;

    /// Every registered competition season.
    async fn seasons(&self) -> Result<Vec<SeasonMeta>, StorageError>;

    /// Every fight in the ledger across all competitions and seasons,
    /// chronologically ordered.
    async fn all_fights(&self) -> Result<Vec<Fight>, StorageError>;

    /// All fights of one competition season, chronologically ordered.
    /// `division` narrows to one division when given.
    async fn list_fights(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: Option<u32>,
    ) -> Result<Vec<Fight>, StorageError>;

    /// The fixed roster of one division.
    async fn fighter_roster(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Vec<FighterId>, StorageError>;

    /// A league season's schedule grouped by division, if registered.
    async fn league_season(
        &self,
        competition_id: &CompetitionId,
        season: u32,
    ) -> Result<Option<LeagueSeasonView>, StorageError>;

    /// The cup season of the given kind spawned from `linked_league_season`,
    /// if it has been created yet.
    async fn cup_season(
        &self,
        kind: CompetitionKind,
        linked_league_season: &SeasonId,
    ) -> Result<Option<CupSeasonView>, StorageError>;
}

/// Read/write access to derived snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_standings_snapshot(
        &self,
        snapshot: &StandingsSnapshot,
    ) -> Result<(), StorageError>;

    async fn latest_standings_snapshot(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Option<StandingsSnapshot>, StorageError>;

    async fn list_standings_snapshots(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Vec<StandingsSnapshot>, StorageError>;

    /// Replace the whole streak state with a new generation and swap the
    /// current pointer to it. Readers see either the old generation or the
    /// new one, never a mix.
    async fn save_streak_states(
        &self,
        states: &BTreeMap<FighterId, FighterStreakState>,
    ) -> Result<(), StorageError>;

    async fn load_streak_states(
        &self,
    ) -> Result<BTreeMap<FighterId, FighterStreakState>, StorageError>;

    /// Persist a new ranking snapshot and atomically make it current.
    /// Returns the snapshot with `is_current` set.
    async fn promote_rank_snapshot(
        &self,
        snapshot: GlobalRankSnapshot,
    ) -> Result<GlobalRankSnapshot, StorageError>;

    async fn current_rank_snapshot(&self) -> Result<Option<GlobalRankSnapshot>, StorageError>;

    /// Every persisted ranking snapshot, `is_current` derived from the
    /// pointer.
    async fn list_rank_snapshots(&self) -> Result<Vec<GlobalRankSnapshot>, StorageError>;

    /// Rewrite the denormalized rank pointers of every fighter named in
    /// `pointers`, as one read-modify-write of the fighters file.
    async fn update_fighter_rank_pointers(
        &self,
        pointers: &BTreeMap<FighterId, RankPointer>,
    ) -> Result<(), StorageError>;
}

/// One fighter's streak state as a JSONL line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakStateRecord {
    pub fighter_id: FighterId,
    pub state: FighterStreakState,
}

/// JSONL data lake implementation of both seams.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Register a season in the ledger.
    pub fn save_season(&self, meta: &SeasonMeta) -> Result<(), StorageError> {
        JsonlWriter::new(EntityType::Season.path(&self.config, "", 0)).append(meta)
    }

    /// Append fights to a season's ledger.
    pub fn save_fights(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        fights: &[Fight],
    ) -> Result<usize, StorageError> {
        JsonlWriter::new(EntityType::Fight.path(&self.config, competition_id.as_str(), season))
            .append_batch(fights)
    }

    /// Register a division roster.
    pub fn save_roster(&self, roster: &Roster) -> Result<(), StorageError> {
        JsonlWriter::new(EntityType::Roster.path(
            &self.config,
            roster.competition_id.as_str(),
            roster.season,
        ))
        .append(roster)
    }

    /// Replace one fight in a season's ledger with its decided version.
    /// A winner, once recorded, is immutable: a conflicting rewrite is
    /// refused rather than silently corrupting every derived snapshot.
    pub fn record_result(&self, fight: &Fight) -> Result<(), StorageError> {
        let path = EntityType::Fight.path(&self.config, fight.competition_id.as_str(), fight.season);
        let mut fights: Vec<Fight> = JsonlReader::new(path.clone()).read_all()?;
        match fights.iter_mut().find(|f| f.id == fight.id) {
            Some(existing) => {
                if existing.is_decided() && existing.winner != fight.winner {
                    return Err(StorageError::ResultConflict(format!(
                        "fight {} already has a recorded winner",
                        existing.identifier
                    )));
                }
                *existing = fight.clone();
            }
            None => fights.push(fight.clone()),
        }
        JsonlWriter::new(path).write_all(&fights)?;
        Ok(())
    }

    /// All fighters in the ledger.
    pub fn fighters(&self) -> Result<Vec<crate::models::Fighter>, StorageError> {
        JsonlReader::new(EntityType::Fighter.path(&self.config, "", 0)).read_all()
    }

    /// Append fighters to the ledger.
    pub fn save_fighters(&self, fighters: &[crate::models::Fighter]) -> Result<usize, StorageError> {
        JsonlWriter::new(EntityType::Fighter.path(&self.config, "", 0)).append_batch(fighters)
    }

    fn standings_path(&self, competition_id: &CompetitionId, season: u32, division: u32) -> PathBuf {
        self.config
            .standings_division_dir(competition_id.as_str(), season, division)
            .join("snapshots.jsonl")
    }

    /// Atomically replace a pointer file: write a sibling temp file, then
    /// rename over the target.
    fn swap_pointer(path: &Path, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_pointer(path: &Path) -> Result<Option<String>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?.trim().to_string()))
    }

    fn streaks_pointer(&self) -> PathBuf {
        self.config.streaks_dir().join("CURRENT")
    }

    fn rankings_pointer(&self) -> PathBuf {
        self.config.rankings_dir().join("CURRENT")
    }

    fn rank_snapshot_path(&self, id: &Uuid) -> PathBuf {
        self.config.rankings_dir().join(format!("{}.json", id))
    }

    fn load_rank_snapshot(&self, id: &str) -> Result<GlobalRankSnapshot, StorageError> {
        let path = self.config.rankings_dir().join(format!("{}.json", id));
        if !path.exists() {
            return Err(StorageError::PathNotFound(path));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl FightSource for JsonlStore {
    async fn list_fighters(&self) -> Result<Vec<crate::models::Fighter>, StorageError> {
        self.fighters()
    }

    async fn seasons(&self) -> Result<Vec<SeasonMeta>, StorageError> {
        JsonlReader::new(EntityType::Season.path(&self.config, "", 0)).read_all()
    }

    async fn all_fights(&self) -> Result<Vec<Fight>, StorageError> {
        let mut fights = Vec::new();
        for meta in self.seasons().await? {
            let path = EntityType::Fight.path(&self.config, meta.competition_id.as_str(), meta.season);
            let season_fights: Vec<Fight> = JsonlReader::new(path).read_all()?;
            fights.extend(season_fights);
        }
        fights.sort_by_key(|f| f.chronological_key());
        Ok(fights)
    }

    async fn list_fights(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: Option<u32>,
    ) -> Result<Vec<Fight>, StorageError> {
        let path = EntityType::Fight.path(&self.config, competition_id.as_str(), season);
        let mut fights: Vec<Fight> = JsonlReader::new(path).read_all()?;
        if let Some(d) = division {
            fights.retain(|f| f.division == d);
        }
        fights.sort_by_key(|f| f.chronological_key());
        Ok(fights)
    }

    async fn fighter_roster(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Vec<FighterId>, StorageError> {
        let path = EntityType::Roster.path(&self.config, competition_id.as_str(), season);
        let rosters: Vec<Roster> = JsonlReader::new(path).read_all()?;
        Ok(rosters
            .into_iter()
            .find(|r| r.division == division)
            .map(|r| r.fighters)
            .unwrap_or_default())
    }

    async fn league_season(
        &self,
        competition_id: &CompetitionId,
        season: u32,
    ) -> Result<Option<LeagueSeasonView>, StorageError> {
        let meta = match self.seasons().await?.into_iter().find(|m| {
            m.kind == CompetitionKind::League
                && m.competition_id == *competition_id
                && m.season == season
        }) {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let fights = self.list_fights(competition_id, season, None).await?;
        let divisions = meta
            .divisions
            .iter()
            .map(|d| DivisionView {
                division: d.division,
                total_rounds: d.total_rounds,
                fights: fights
                    .iter()
                    .filter(|f| f.division == d.division)
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(Some(LeagueSeasonView {
            season_id: meta.season_id,
            season: meta.season,
            divisions,
        }))
    }

    async fn cup_season(
        &self,
        kind: CompetitionKind,
        linked_league_season: &SeasonId,
    ) -> Result<Option<CupSeasonView>, StorageError> {
        let meta = match self.seasons().await?.into_iter().find(|m| {
            m.kind == kind && m.linked_league_season.as_ref() == Some(linked_league_season)
        }) {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let fights = self
            .list_fights(&meta.competition_id, meta.season, None)
            .await?;

        Ok(Some(CupSeasonView {
            season_id: meta.season_id,
            kind,
            linked_league_season: linked_league_season.clone(),
            fights,
        }))
    }
}

#[async_trait]
impl SnapshotStore for JsonlStore {
    async fn save_standings_snapshot(
        &self,
        snapshot: &StandingsSnapshot,
    ) -> Result<(), StorageError> {
        let path = self.standings_path(&snapshot.competition_id, snapshot.season, snapshot.division);
        JsonlWriter::new(path).append(snapshot)
    }

    async fn latest_standings_snapshot(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Option<StandingsSnapshot>, StorageError> {
        // Snapshots are append-only in fight order; the last line is latest.
        let path = self.standings_path(competition_id, season, division);
        let mut snapshots: Vec<StandingsSnapshot> = JsonlReader::new(path).read_all()?;
        Ok(snapshots.pop())
    }

    async fn list_standings_snapshots(
        &self,
        competition_id: &CompetitionId,
        season: u32,
        division: u32,
    ) -> Result<Vec<StandingsSnapshot>, StorageError> {
        let path = self.standings_path(competition_id, season, division);
        JsonlReader::new(path).read_all()
    }

    async fn save_streak_states(
        &self,
        states: &BTreeMap<FighterId, FighterStreakState>,
    ) -> Result<(), StorageError> {
        let generation = format!("gen-{}", Uuid::new_v4());
        let path = self
            .config
            .streaks_dir()
            .join(&generation)
            .join("states.jsonl");

        let records: Vec<StreakStateRecord> = states
            .iter()
            .map(|(fighter_id, state)| StreakStateRecord {
                fighter_id: fighter_id.clone(),
                state: state.clone(),
            })
            .collect();
        JsonlWriter::new(path).write_all(&records)?;

        Self::swap_pointer(&self.streaks_pointer(), &generation)?;
        info!(
            "Saved streak states for {} fighters as {}",
            records.len(),
            generation
        );
        Ok(())
    }

    async fn load_streak_states(
        &self,
    ) -> Result<BTreeMap<FighterId, FighterStreakState>, StorageError> {
        let generation = match Self::read_pointer(&self.streaks_pointer())? {
            Some(g) => g,
            None => return Ok(BTreeMap::new()),
        };
        let path = self
            .config
            .streaks_dir()
            .join(generation)
            .join("states.jsonl");
        let records: Vec<StreakStateRecord> = JsonlReader::new(path).read_all()?;
        Ok(records
            .into_iter()
            .map(|r| (r.fighter_id, r.state))
            .collect())
    }

    async fn promote_rank_snapshot(
        &self,
        snapshot: GlobalRankSnapshot,
    ) -> Result<GlobalRankSnapshot, StorageError> {
        let path = self.rank_snapshot_path(&snapshot.id);
        if path.exists() {
            return Err(StorageError::PromotionConflict(format!(
                "snapshot {} already persisted",
                snapshot.id
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Stored copies never carry the flag; currency lives in the pointer.
        let mut stored = snapshot;
        stored.is_current = false;
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;

        Self::swap_pointer(&self.rankings_pointer(), &stored.id.to_string())?;
        debug!("Promoted ranking snapshot {}", stored.id);

        stored.is_current = true;
        Ok(stored)
    }

    async fn current_rank_snapshot(&self) -> Result<Option<GlobalRankSnapshot>, StorageError> {
        let id = match Self::read_pointer(&self.rankings_pointer())? {
            Some(id) => id,
            None => return Ok(None),
        };
        let mut snapshot = self.load_rank_snapshot(&id)?;
        snapshot.is_current = true;
        Ok(Some(snapshot))
    }

    async fn list_rank_snapshots(&self) -> Result<Vec<GlobalRankSnapshot>, StorageError> {
        let dir = self.config.rankings_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let current = Self::read_pointer(&self.rankings_pointer())?;

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let contents = fs::read_to_string(&path)?;
                let mut snapshot: GlobalRankSnapshot = serde_json::from_str(&contents)?;
                snapshot.is_current = current.as_deref() == Some(snapshot.id.to_string().as_str());
                snapshots.push(snapshot);
            }
        }
        snapshots.sort_by_key(|s| s.created_at);
        Ok(snapshots)
    }

    async fn update_fighter_rank_pointers(
        &self,
        pointers: &BTreeMap<FighterId, RankPointer>,
    ) -> Result<(), StorageError> {
        let path = EntityType::Fighter.path(&self.config, "", 0);
        let mut fighters: Vec<crate::models::Fighter> = JsonlReader::new(path.clone()).read_all()?;
        for fighter in fighters.iter_mut() {
            if let Some(pointer) = pointers.get(&fighter.id) {
                fighter.global_rank = Some(pointer.clone());
            }
        }
        JsonlWriter::new(path).write_all(&fighters)?;
        Ok(())
    }
}
