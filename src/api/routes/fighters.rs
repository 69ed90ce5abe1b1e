use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{EntityId, FighterId, OpponentHistoryEntry, StreakRecord};
use crate::storage::SnapshotStore;

#[derive(Debug, Serialize)]
pub struct StreaksResponse {
    pub fighter_id: FighterId,
    pub streaks: Vec<StreakRecord>,
    pub active_streak: Option<StreakRecord>,
    pub longest_win_streak: u32,
}

pub async fn fighter_streaks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StreaksResponse>, ApiError> {
    let fighter_id: FighterId = EntityId::from(id.as_str());
    let states = state.store.load_streak_states().await?;
    let streak_state = states
        .get(&fighter_id)
        .ok_or_else(|| ApiError::NotFound(format!("No streak state for fighter: {}", id)))?;

    Ok(Json(StreaksResponse {
        fighter_id,
        streaks: streak_state.streaks.clone(),
        active_streak: streak_state.active_streak().cloned(),
        longest_win_streak: streak_state.longest_win_streak(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub fighter_id: FighterId,
    pub total_fights: u32,
    pub total_wins: u32,
    pub opponents: Vec<OpponentHistoryEntry>,
}

pub async fn fighter_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let fighter_id: FighterId = EntityId::from(id.as_str());
    let states = state.store.load_streak_states().await?;
    let streak_state = states
        .get(&fighter_id)
        .ok_or_else(|| ApiError::NotFound(format!("No streak state for fighter: {}", id)))?;

    Ok(Json(HistoryResponse {
        fighter_id,
        total_fights: streak_state.total_fights(),
        total_wins: streak_state.total_wins(),
        opponents: streak_state.opponent_history.clone(),
    }))
}
