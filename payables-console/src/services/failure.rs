//! Structured failure payloads from the collaborator.

use serde::Serialize;
use thiserror::Error;

/// Body of a non-success response, kept in whatever shape it arrived.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    /// `None` for an empty body; JSON when it parses, raw text otherwise.
    pub fn from_text(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(
            serde_json::from_str(text)
                .map(ResponseBody::Json)
                .unwrap_or_else(|_| ResponseBody::Text(text.to_string())),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorFailure {
    /// The collaborator answered with a non-success status.
    #[error("collaborator rejected the request with status {status}")]
    Rejected {
        status: u16,
        body: Option<ResponseBody>,
    },

    /// No response was received (connection refused, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A success response whose body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl CollaboratorFailure {
    pub fn rejected(status: u16, body: Option<ResponseBody>) -> Self {
        CollaboratorFailure::Rejected { status, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CollaboratorFailure::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for CollaboratorFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollaboratorFailure::Decode(err.to_string())
        } else {
            CollaboratorFailure::Transport(err.to_string())
        }
    }
}

/// Turn a response into `Ok(response)` on success or a `Rejected` failure.
pub async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, CollaboratorFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %text, "Collaborator rejected request");

    Err(CollaboratorFailure::rejected(
        status.as_u16(),
        ResponseBody::from_text(&text),
    ))
}
