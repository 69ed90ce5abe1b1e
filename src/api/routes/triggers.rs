//! Trigger endpoints.
//!
//! Each endpoint validates the request and enqueues an event for the
//! pipeline worker; the derived-state work itself happens off the request
//! path.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::EntityId;
use crate::pipeline::EngineEvent;

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub enqueued: bool,
}

#[derive(Debug, Deserialize)]
pub struct FightDecidedRequest {
    pub competition: String,
    pub season: u32,
    pub division: u32,
    pub fight_id: String,
}

pub async fn fight_decided(
    State(state): State<AppState>,
    Json(req): Json<FightDecidedRequest>,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    if req.competition.is_empty() || req.fight_id.is_empty() {
        return Err(ApiError::BadRequest(
            "competition and fight_id must be non-empty".to_string(),
        ));
    }

    enqueue(
        &state,
        EngineEvent::FightDecided {
            competition_id: EntityId::from(req.competition.as_str()),
            season: req.season,
            division: req.division,
            fight_id: EntityId::from(req.fight_id.as_str()),
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct SeasonChangedRequest {
    pub competition: String,
}

pub async fn season_changed(
    State(state): State<AppState>,
    Json(req): Json<SeasonChangedRequest>,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    if req.competition.is_empty() {
        return Err(ApiError::BadRequest(
            "competition must be non-empty".to_string(),
        ));
    }

    enqueue(
        &state,
        EngineEvent::SeasonDataChanged {
            competition_id: EntityId::from(req.competition.as_str()),
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct CupFightDecidedRequest {
    pub cup_competition: String,
    pub season: u32,
    pub fight_id: String,
}

pub async fn cup_fight_decided(
    State(state): State<AppState>,
    Json(req): Json<CupFightDecidedRequest>,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    if req.cup_competition.is_empty() || req.fight_id.is_empty() {
        return Err(ApiError::BadRequest(
            "cup_competition and fight_id must be non-empty".to_string(),
        ));
    }

    enqueue(
        &state,
        EngineEvent::CupFightDecided {
            cup_competition_id: EntityId::from(req.cup_competition.as_str()),
            season: req.season,
            fight_id: EntityId::from(req.fight_id.as_str()),
        },
    )
    .await
}

async fn enqueue(
    state: &AppState,
    event: EngineEvent,
) -> Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    state
        .events
        .send(event)
        .await
        .map_err(|_| ApiError::Internal("event queue closed".to_string()))?;
    Ok((StatusCode::ACCEPTED, Json(TriggerResponse { enqueued: true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::config::AppConfig;
    use crate::storage::{JsonlStore, StorageConfig};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn test_state(dir: &std::path::Path) -> (AppState, mpsc::Receiver<EngineEvent>) {
        let store = Arc::new(JsonlStore::new(StorageConfig::new(dir.to_path_buf())));
        let (events, rx) = mpsc::channel(8);
        (
            AppState {
                store,
                events,
                config: Arc::new(AppConfig::default()),
            },
            rx,
        )
    }

    async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_fight_decided_enqueues() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, mut rx) = test_state(tmp.path());
        let app = build_router(state);

        let (status, json) = post_json(
            app,
            "/api/triggers/fight-decided",
            r#"{"competition":"league","season":1,"division":2,"fight_id":"f1"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["enqueued"], true);

        match rx.try_recv().unwrap() {
            EngineEvent::FightDecided {
                competition_id,
                season,
                division,
                fight_id,
            } => {
                assert_eq!(competition_id, EntityId::from("league"));
                assert_eq!(season, 1);
                assert_eq!(division, 2);
                assert_eq!(fight_id, EntityId::from("f1"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_season_changed_enqueues() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, mut rx) = test_state(tmp.path());
        let app = build_router(state);

        let (status, _) = post_json(
            app,
            "/api/triggers/season-changed",
            r#"{"competition":"league"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(matches!(
            rx.try_recv().unwrap(),
            EngineEvent::SeasonDataChanged { .. }
        ));
    }

    #[tokio::test]
    async fn test_cup_fight_decided_enqueues() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, mut rx) = test_state(tmp.path());
        let app = build_router(state);

        let (status, _) = post_json(
            app,
            "/api/triggers/cup-fight-decided",
            r#"{"cup_competition":"cc","season":1,"fight_id":"f9"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        match rx.try_recv().unwrap() {
            EngineEvent::CupFightDecided {
                cup_competition_id,
                season,
                fight_id,
            } => {
                assert_eq!(cup_competition_id, EntityId::from("cc"));
                assert_eq!(season, 1);
                assert_eq!(fight_id, EntityId::from("f9"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_competition_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, mut rx) = test_state(tmp.path());
        let app = build_router(state);

        let (status, json) = post_json(
            app,
            "/api/triggers/season-changed",
            r#"{"competition":""}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _rx) = test_state(tmp.path());
        let app = build_router(state);

        let (status, _) = post_json(app, "/api/triggers/fight-decided", r#"{"nope":1}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
