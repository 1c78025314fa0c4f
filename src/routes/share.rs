use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{new_visible_id, NewShare, Share, ShareStatus, ShareView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub interaction_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub share: Share,
}

/// Snapshot the caller's outcome on a problem into an immutable share row.
pub async fn create_share(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ShareRequest>,
) -> Result<Json<ShareResponse>> {
    let (interaction, problem_title) = state
        .repository
        .get_owned_interaction(body.interaction_id, &user.id)
        .await?
        .ok_or(AppError::NotFound("Interaction"))?;

    let status = ShareStatus::for_interaction(&interaction);
    let share = state
        .repository
        .insert_share(NewShare {
            share_code: new_visible_id(),
            interaction_id: interaction.id,
            status,
            share_message: status.share_message(&problem_title),
        })
        .await?;

    Ok(Json(ShareResponse { share }))
}

/// Public lookup for share links: no session required, resolves the
/// interaction's visible id for social-preview rendering.
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ShareView>> {
    let view = state
        .repository
        .get_share_view(&code)
        .await?
        .ok_or(AppError::NotFound("Share"))?;
    Ok(Json(view))
}
