use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

use super::client::Identity;

/// The authenticated caller, resolved from the session cookie or a bearer
/// Authorization header. Rejects with 401 when no valid session is present.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            avatar_url: identity.avatar_url,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.config.session_cookie)
            .ok_or(AppError::Unauthorized)?;

        let identity = state
            .identity
            .verify_token(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(identity.into())
    }
}

/// An authenticated caller whose profile carries the admin role. Rejection
/// is the same 401 as a missing session.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let profile = state.repository.get_profile(&user.id).await?;
        match profile {
            Some(profile) if profile.role == Role::Admin => Ok(AdminUser(user)),
            _ => Err(AppError::Unauthorized),
        }
    }
}

fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    if let Some(auth) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_name: header::HeaderName, value: &str) -> Parts {
        let request = Request::builder()
            .header(header_name, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn bearer_header_wins() {
        let parts = parts_with(header::AUTHORIZATION, "Bearer tok-123");
        assert_eq!(
            session_token(&parts, "sb-access-token"),
            Some("tok-123".to_string())
        );
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let parts = parts_with(
            header::COOKIE,
            "theme=dark; sb-access-token=tok-456; lang=en",
        );
        assert_eq!(
            session_token(&parts, "sb-access-token"),
            Some("tok-456".to_string())
        );
    }

    #[test]
    fn missing_session_yields_none() {
        let parts = parts_with(header::COOKIE, "theme=dark");
        assert_eq!(session_token(&parts, "sb-access-token"), None);
    }
}
