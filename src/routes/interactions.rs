use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::Reaction;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub interaction_id: i64,
    /// `null` (or absent) clears the reaction.
    #[serde(default)]
    pub reaction: Option<Reaction>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn record_reaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<SuccessResponse>> {
    state
        .tracker
        .record_reaction(&user.id, body.interaction_id, body.reaction)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedRequest {
    pub interaction_id: i64,
    pub solved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedResponse {
    pub success: bool,
    pub solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
}

pub async fn set_solved(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SolvedRequest>,
) -> Result<Json<SolvedResponse>> {
    let outcome = state
        .tracker
        .set_solved(&user.id, body.interaction_id, body.solved)
        .await?;

    Ok(Json(SolvedResponse {
        success: true,
        solved: outcome.solved,
        time_spent_seconds: outcome.time_spent_seconds,
    }))
}
