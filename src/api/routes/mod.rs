use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::state::AppState;

pub mod fighters;
pub mod meta;
pub mod rankings;
pub mod standings;
pub mod triggers;

/// Build the API router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.config.server.cors_origin.as_str() {
        "*" => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                warn!("Invalid CORS origin {:?}, allowing any", origin);
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        },
    };

    Router::new()
        .route("/health", get(meta::health))
        .route("/api/meta", get(meta::meta))
        .route("/api/standings", get(standings::get_standings))
        .route("/api/fighters/:id/streaks", get(fighters::fighter_streaks))
        .route("/api/fighters/:id/history", get(fighters::fighter_history))
        .route("/api/rankings/current", get(rankings::current_ranking))
        .route("/api/triggers/fight-decided", post(triggers::fight_decided))
        .route("/api/triggers/season-changed", post(triggers::season_changed))
        .route(
            "/api/triggers/cup-fight-decided",
            post(triggers::cup_fight_decided),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
