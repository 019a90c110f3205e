use crate::config::CollaboratorSettings;
use crate::services::failure::{check_status, CollaboratorFailure};
use reqwest::Client;
use secrecy::Secret;
use serde::Deserialize;
use service_core::observability::TracedClientExt;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Session bootstrap against the collaborator's `/auth/login`.
pub struct AuthClient {
    client: Client,
    settings: CollaboratorSettings,
}

impl AuthClient {
    pub fn new(settings: CollaboratorSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &CollaboratorSettings {
        &self.settings
    }

    /// Exchange operator credentials for a bearer token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Secret<String>, CollaboratorFailure> {
        let url = format!("{}/auth/login", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .traced_post(&url)
            .form(&[("username", username), ("password", password)])
            .timeout(self.settings.request_timeout())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send login request to {}: {}", url, e);
                CollaboratorFailure::from(e)
            })?;

        let tokens: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CollaboratorFailure::Decode(e.to_string()))?;

        if tokens.access_token.is_empty() {
            return Err(CollaboratorFailure::Decode(
                "login response carried no access token".to_string(),
            ));
        }

        tracing::info!(username = %username, "Operator logged in");
        Ok(Secret::new(tokens.access_token))
    }
}
