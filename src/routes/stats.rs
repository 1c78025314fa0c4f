use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{LeaderboardEntry, UserStats};
use crate::state::AppState;

const MAX_LEADERBOARD_LIMIT: usize = 100;

pub async fn user_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserStats>> {
    let stats = state.stats.user_stats(&user.id).await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let limit = query
        .limit
        .unwrap_or(state.config.default_leaderboard_limit)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let leaderboard = state.stats.leaderboard(limit).await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}
