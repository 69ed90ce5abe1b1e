use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{
    CompetitionKind, EntityId, FighterStanding, StandingZone, StandingsSnapshot,
};
use crate::storage::{FightSource, SnapshotStore};

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    pub competition: String,
    pub season: u32,
    pub division: u32,
    /// When given, the latest snapshot of that round instead of the
    /// division's latest overall
    pub round: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StandingRow {
    #[serde(flatten)]
    pub standing: FighterStanding,

    /// Present only on final-round snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<StandingZone>,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub id: String,
    pub competition: String,
    pub season: u32,
    pub division: u32,
    pub round: u32,
    pub fight_identifier: String,
    pub total_fighters_count: u32,
    pub computed_at: DateTime<Utc>,
    pub standings: Vec<StandingRow>,
}

pub async fn get_standings(
    State(state): State<AppState>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let competition_id = EntityId::from(params.competition.as_str());

    let snapshot = match params.round {
        None => {
            state
                .store
                .latest_standings_snapshot(&competition_id, params.season, params.division)
                .await?
        }
        Some(round) => state
            .store
            .list_standings_snapshots(&competition_id, params.season, params.division)
            .await?
            .into_iter()
            .filter(|s| s.round == round)
            .last(),
    };
    let snapshot = snapshot.ok_or_else(|| {
        ApiError::NotFound(format!(
            "No standings for {} season {} division {}",
            params.competition, params.season, params.division
        ))
    })?;

    let is_final_round = final_round_of(&state, &snapshot).await? == Some(snapshot.round);

    let total = snapshot.total_fighters_count;
    let standings = snapshot
        .standings
        .iter()
        .map(|s| StandingRow {
            standing: s.clone(),
            zone: is_final_round.then(|| StandingZone::classify(s.rank, total)),
        })
        .collect();

    Ok(Json(StandingsResponse {
        id: snapshot.id.to_string(),
        competition: params.competition,
        season: snapshot.season,
        division: snapshot.division,
        round: snapshot.round,
        fight_identifier: snapshot.fight_identifier,
        total_fighters_count: total,
        computed_at: snapshot.computed_at,
        standings,
    }))
}

/// The scheduled final round of the snapshot's division, if the season is
/// registered.
async fn final_round_of(
    state: &AppState,
    snapshot: &StandingsSnapshot,
) -> Result<Option<u32>, ApiError> {
    let seasons = state.store.seasons().await?;
    Ok(seasons
        .iter()
        .find(|m| {
            m.kind == CompetitionKind::League
                && m.competition_id == snapshot.competition_id
                && m.season == snapshot.season
        })
        .and_then(|m| {
            m.divisions
                .iter()
                .find(|d| d.division == snapshot.division)
                .map(|d| d.total_rounds)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::config::AppConfig;
    use crate::models::{DivisionMeta, SeasonMeta};
    use crate::storage::{JsonlStore, StorageConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn test_state(dir: &std::path::Path) -> AppState {
        let store = Arc::new(JsonlStore::new(StorageConfig::new(dir.to_path_buf())));
        let (events, _rx) = mpsc::channel(8);
        AppState {
            store,
            events,
            config: Arc::new(AppConfig::default()),
        }
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn row(id: &str, rank: u32, points: u32) -> FighterStanding {
        FighterStanding {
            fighter_id: EntityId::from(id),
            fights_count: 1,
            wins: if points > 0 { 1 } else { 0 },
            points,
            rank,
        }
    }

    async fn seed_snapshot(state: &AppState, round: u32, rows: Vec<FighterStanding>) {
        let snapshot = StandingsSnapshot::new(
            EntityId::from("league"),
            1,
            1,
            round,
            format!("R{:02}-F01", round),
            rows,
        );
        state.store.save_standings_snapshot(&snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn test_standings_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()));

        let (status, json) =
            get_json(app, "/api/standings?competition=league&season=1&division=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_standings_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        seed_snapshot(&state, 1, vec![row("alpha", 1, 3), row("bravo", 2, 0)]).await;
        seed_snapshot(&state, 2, vec![row("alpha", 1, 6), row("bravo", 2, 0)]).await;

        let app = build_router(state);
        let (status, json) =
            get_json(app, "/api/standings?competition=league&season=1&division=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["round"], 2);
        assert_eq!(json["standings"][0]["points"], 6);
        // Season not registered: no final-round zones.
        assert!(json["standings"][0].get("zone").is_none());
    }

    #[tokio::test]
    async fn test_standings_specific_round() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        seed_snapshot(&state, 1, vec![row("alpha", 1, 3)]).await;
        seed_snapshot(&state, 2, vec![row("alpha", 1, 6)]).await;

        let app = build_router(state);
        let (status, json) = get_json(
            app,
            "/api/standings?competition=league&season=1&division=1&round=1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["round"], 1);
        assert_eq!(json["standings"][0]["points"], 3);
    }

    #[tokio::test]
    async fn test_final_round_carries_zones() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        state
            .store
            .save_season(&SeasonMeta::league(
                EntityId::from("league"),
                1,
                vec![DivisionMeta {
                    division: 1,
                    total_rounds: 2,
                }],
            ))
            .unwrap();
        seed_snapshot(&state, 1, vec![row("alpha", 1, 3)]).await;
        seed_snapshot(
            &state,
            2,
            vec![
                row("alpha", 1, 9),
                row("bravo", 2, 6),
                row("charlie", 3, 3),
                row("delta", 4, 3),
                row("echo", 5, 0),
            ],
        )
        .await;

        let app = build_router(state);
        let (status, json) =
            get_json(app, "/api/standings?competition=league&season=1&division=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["standings"][0]["zone"], "promotion");
        assert_eq!(json["standings"][1]["zone"], "promotion");
        assert_eq!(json["standings"][2]["zone"], "safe");
        assert_eq!(json["standings"][3]["zone"], "relegation");
        assert_eq!(json["standings"][4]["zone"], "relegation");
    }

    #[tokio::test]
    async fn test_non_final_round_has_no_zones() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        state
            .store
            .save_season(&SeasonMeta::league(
                EntityId::from("league"),
                1,
                vec![DivisionMeta {
                    division: 1,
                    total_rounds: 2,
                }],
            ))
            .unwrap();
        seed_snapshot(&state, 1, vec![row("alpha", 1, 3)]).await;

        let app = build_router(state);
        let (_, json) =
            get_json(app, "/api/standings?competition=league&season=1&division=1").await;
        assert!(json["standings"][0].get("zone").is_none());
    }

    #[tokio::test]
    async fn test_missing_params_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()));

        let (status, _) = get_json(app, "/api/standings?competition=league").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
