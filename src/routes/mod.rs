use std::time::Duration;

use axum::http::{header::CONTENT_TYPE, header::AUTHORIZATION, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod admin;
pub mod feed;
pub mod interactions;
pub mod profile;
pub mod share;
pub mod stats;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/problems", get(feed::next_problems))
        .route("/api/problems/reaction", post(interactions::record_reaction))
        .route("/api/problems/solved", post(interactions::set_solved))
        .route("/api/problems/share", post(share::create_share))
        .route("/api/share/{code}", get(share::lookup))
        .route("/api/stats", get(stats::user_stats))
        .route("/api/leaderboard", get(stats::leaderboard))
        .route("/api/auth/sync-profile", post(profile::sync_profile))
        .route("/api/admin/problems", get(admin::list).post(admin::create))
        .route(
            "/api/admin/problems/{id}",
            get(admin::get)
                .put(admin::update)
                .patch(admin::patch)
                .delete(admin::remove),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
