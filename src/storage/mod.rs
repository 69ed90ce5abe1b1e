//! Filesystem data lake operations.
//!
//! Handles reading and writing to the local data lake:
//! - Ledger records (fighters, seasons, rosters, fights)
//! - Standings snapshots (append-only, one per completed fight)
//! - Streak state generations
//! - Global ranking snapshots and the current-snapshot pointer

use std::path::PathBuf;
use thiserror::Error;

mod jsonl;
mod store;

pub use jsonl::{EntityType, JsonlReader, JsonlWriter};
pub use store::{FightSource, JsonlStore, SnapshotStore, StreakStateRecord};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Snapshot promotion conflict: {0}")]
    PromotionConflict(String),

    #[error("Result conflict: {0}")]
    ResultConflict(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn standings_dir(&self) -> PathBuf {
        self.data_dir.join("standings")
    }

    pub fn streaks_dir(&self) -> PathBuf {
        self.data_dir.join("streaks")
    }

    pub fn rankings_dir(&self) -> PathBuf {
        self.data_dir.join("rankings")
    }

    /// Directory holding one competition season's ledger files.
    pub fn season_dir(&self, competition_id: &str, season: u32) -> PathBuf {
        self.ledger_dir()
            .join(competition_id)
            .join(format!("S{:02}", season))
    }

    /// Directory holding one division's standings snapshots.
    pub fn standings_division_dir(
        &self,
        competition_id: &str,
        season: u32,
        division: u32,
    ) -> PathBuf {
        self.standings_dir()
            .join(competition_id)
            .join(format!("S{:02}", season))
            .join(format!("D{}", division))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.ledger_dir(), PathBuf::from("/data/ledger"));
        assert_eq!(config.standings_dir(), PathBuf::from("/data/standings"));
        assert_eq!(config.streaks_dir(), PathBuf::from("/data/streaks"));
        assert_eq!(config.rankings_dir(), PathBuf::from("/data/rankings"));
    }

    #[test]
    fn test_season_dir_layout() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        assert_eq!(
            config.season_dir("league", 4),
            PathBuf::from("/data/ledger/league/S04")
        );
        assert_eq!(
            config.standings_division_dir("league", 4, 2),
            PathBuf::from("/data/standings/league/S04/D2")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
