use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::RankEntry;
use crate::storage::SnapshotStore;

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<RankEntry>,
}

pub async fn current_ranking(
    State(state): State<AppState>,
) -> Result<Json<RankingResponse>, ApiError> {
    let snapshot = state
        .store
        .current_rank_snapshot()
        .await?
        .ok_or_else(|| ApiError::NotFound("No ranking snapshot promoted yet".to_string()))?;

    Ok(Json(RankingResponse {
        id: snapshot.id.to_string(),
        created_at: snapshot.created_at,
        entries: snapshot.entries,
    }))
}
