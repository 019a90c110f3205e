use crate::console::{ConsoleView, PayablesConsole};
use crate::models::user::{OperatorSession, CONSOLE_ID_KEY, USERNAME_KEY};
use crate::utils::error_message::normalize_failure;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use tower_sessions::Session;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Informe o usuário"))]
    pub username: String,
    #[validate(length(min = 1, message = "Informe a senha"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub view: ConsoleView,
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("session store error: {}", err))
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let access_token = state
        .auth_client
        .login(&payload.username, &payload.password)
        .await
        .map_err(|failure| {
            let message = normalize_failure(&failure);
            match failure.status() {
                Some(status) if (400..500).contains(&status) => {
                    tracing::warn!(username = %payload.username, status, "Login rejected");
                    AppError::Unauthorized(anyhow::anyhow!(message))
                }
                _ => AppError::BadGateway(message),
            }
        })?;

    let console = Arc::new(PayablesConsole::new((state.api_factory)(access_token)));

    // Opening the console loads the summary and the supplier list.
    if let Err(e) = console.load_summary().await {
        tracing::warn!(error = %e, "Initial summary load failed");
    }
    console.refresh_suppliers().await;

    // A second login in the same browser replaces the previous console.
    let previous: Option<String> = session.get(CONSOLE_ID_KEY).await.unwrap_or(None);
    if let Some(previous) = previous {
        state.consoles.remove(&previous);
    }

    let console_id = Uuid::new_v4().to_string();
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(CONSOLE_ID_KEY, &console_id)
        .await
        .map_err(session_error)?;
    session
        .insert(USERNAME_KEY, &payload.username)
        .await
        .map_err(session_error)?;

    state.consoles.insert(
        console_id.clone(),
        OperatorSession {
            username: payload.username.clone(),
            console: console.clone(),
        },
    );

    tracing::info!(username = %payload.username, console_id = %console_id, "Console opened");

    Ok(Json(LoginResponse {
        username: payload.username,
        view: console.view().await,
    }))
}

pub async fn logout_handler(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let console_id: Option<String> = session.get(CONSOLE_ID_KEY).await.unwrap_or(None);
    if let Some(console_id) = console_id {
        state.consoles.remove(&console_id);
        tracing::info!(console_id = %console_id, "Console closed");
    }

    // Clear session regardless of whether a console was found
    session.clear().await;

    StatusCode::NO_CONTENT
}
