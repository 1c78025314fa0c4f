use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::NewProfile;
use crate::state::AppState;

use super::interactions::SuccessResponse;

/// Mirror the authenticated identity into an application-owned profile row.
/// Idempotent: an existing profile (including its role) is left untouched.
pub async fn sync_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SuccessResponse>> {
    state
        .repository
        .ensure_profile(NewProfile {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
        })
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}
