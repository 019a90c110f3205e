use crate::console::PayablesConsole;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use service_core::error::AppError;
use std::sync::Arc;
use tower_sessions::Session;

pub const CONSOLE_ID_KEY: &str = "console_id";
pub const USERNAME_KEY: &str = "username";

/// A logged-in operator's console. The bearer credential lives inside the
/// console's collaborator client and never in the session store.
#[derive(Clone)]
pub struct OperatorSession {
    pub username: String,
    pub console: Arc<PayablesConsole>,
}

/// Authenticated operator context extracted from session
#[derive(Clone)]
pub struct Operator {
    pub console_id: String,
    pub username: String,
    pub console: Arc<PayablesConsole>,
}

fn session_expired() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Sessão expirada. Faça login novamente."))
}

#[async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::InternalError(anyhow::anyhow!(message)))?;

        let console_id: Option<String> = session.get(CONSOLE_ID_KEY).await.unwrap_or(None);
        let console_id = console_id.ok_or_else(session_expired)?;

        let operator = state
            .consoles
            .get(&console_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                tracing::debug!(console_id = %console_id, "Session refers to an unknown console");
                session_expired()
            })?;

        Ok(Operator {
            console_id,
            username: operator.username,
            console: operator.console,
        })
    }
}
