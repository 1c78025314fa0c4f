use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Identity resolved by the external auth provider for a session token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: Option<String>,
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Deserialize)]
struct UserMetadata {
    name: Option<String>,
    full_name: Option<String>,
    avatar_url: Option<String>,
}

/// Client for the external identity provider. Session issuance and cookie
/// management live entirely on the provider's side; this only resolves an
/// access token to the identity it was minted for.
pub struct IdentityClient {
    client: Client,
    base_url: String,
    anon_key: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: String, anon_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    /// Resolve an access token. `Ok(None)` means the provider rejected the
    /// token (expired/invalid session); transport or unexpected provider
    /// failures surface as errors.
    pub async fn verify_token(&self, token: &str) -> Result<Option<Identity>> {
        let mut request = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::IdentityApi(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let user: ProviderUser = response.json().await?;
        let metadata = user.user_metadata.unwrap_or(UserMetadata {
            name: None,
            full_name: None,
            avatar_url: None,
        });

        Ok(Some(Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: metadata.name.or(metadata.full_name),
            avatar_url: metadata.avatar_url,
        }))
    }
}
