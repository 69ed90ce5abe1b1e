//! Fighter records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityId, FighterId};

/// Denormalized pointer to a fighter's position in the current global
/// ranking snapshot. A read-through cache, never a source of truth:
/// rewritten synchronously whenever a new snapshot is promoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankPointer {
    pub rank: u32,
    pub score: f64,
    pub snapshot_id: Uuid,
}

/// A competitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fighter {
    /// Unique identifier (derived from the fighter's name)
    pub id: FighterId,

    /// Display name
    pub name: String,

    /// Pointer into the current global ranking, if ranked
    pub global_rank: Option<RankPointer>,
}

impl Fighter {
    /// Create a new Fighter with auto-generated ID.
    pub fn new(name: String) -> Self {
        let id = EntityId::generate(&[&name.to_lowercase()]);
        Self {
            id,
            name,
            global_rank: None,
        }
    }

    /// Builder method to set the rank pointer.
    pub fn with_rank(mut self, pointer: RankPointer) -> Self {
        self.global_rank = Some(pointer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fighter_id_deterministic() {
        let a = Fighter::new("Iron Mongoose".to_string());
        let b = Fighter::new("Iron Mongoose".to_string());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_fighter_id_case_insensitive() {
        let a = Fighter::new("Iron Mongoose".to_string());
        let b = Fighter::new("IRON MONGOOSE".to_string());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_fighter_rank_pointer() {
        let snapshot_id = Uuid::new_v4();
        let fighter = Fighter::new("Iron Mongoose".to_string()).with_rank(RankPointer {
            rank: 3,
            score: 22.0,
            snapshot_id,
        });

        let pointer = fighter.global_rank.unwrap();
        assert_eq!(pointer.rank, 3);
        assert_eq!(pointer.snapshot_id, snapshot_id);
    }

    #[test]
    fn test_fighter_serialization() {
        let fighter = Fighter::new("Iron Mongoose".to_string());
        let json = serde_json::to_string(&fighter).unwrap();
        let deserialized: Fighter = serde_json::from_str(&json).unwrap();
        assert_eq!(fighter.id, deserialized.id);
        assert!(deserialized.global_rank.is_none());
    }
}
