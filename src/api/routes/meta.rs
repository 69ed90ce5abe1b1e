use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::CompetitionKind;
use crate::storage::{FightSource, SnapshotStore};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub fighters: u32,
    pub league_seasons: u32,
    pub cup_seasons: u32,
    pub fights: u32,
    pub decided_fights: u32,
    pub current_ranking: Option<String>,
}

pub async fn meta(State(state): State<AppState>) -> Result<Json<MetaResponse>, ApiError> {
    let fighters = state.store.list_fighters().await?;
    let seasons = state.store.seasons().await?;
    let fights = state.store.all_fights().await?;
    let current = state.store.current_rank_snapshot().await?;

    let league_seasons = seasons
        .iter()
        .filter(|s| s.kind == CompetitionKind::League)
        .count() as u32;

    Ok(Json(MetaResponse {
        fighters: fighters.len() as u32,
        league_seasons,
        cup_seasons: seasons.len() as u32 - league_seasons,
        fights: fights.len() as u32,
        decided_fights: fights.iter().filter(|f| f.is_decided()).count() as u32,
        current_ranking: current.map(|s| s.id.to_string()),
    }))
}
