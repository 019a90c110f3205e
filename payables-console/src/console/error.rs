use crate::console::in_flight::InFlightKey;
use crate::console::transitions::Action;
use crate::models::{InstallmentId, InstallmentStatus};
use crate::services::CollaboratorFailure;
use crate::utils::error_message::normalize_failure;
use crate::utils::format::status_label;
use service_core::error::{field_messages, AppError};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorFailure),

    #[error("{action} refused for installment {id} in status {status}")]
    Refused {
        action: Action,
        id: InstallmentId,
        status: InstallmentStatus,
    },

    #[error("a request for {0} is already in flight")]
    Busy(InFlightKey),

    #[error("installment {0} is not loaded")]
    UnknownInstallment(InstallmentId),
}

impl WorkflowError {
    /// Operator-facing text for the error banner.
    pub fn display_message(&self) -> String {
        match self {
            WorkflowError::Validation(errors) => field_messages(errors)
                .into_values()
                .flatten()
                .collect::<Vec<_>>()
                .join("; "),
            WorkflowError::Collaborator(failure) => normalize_failure(failure),
            WorkflowError::Refused { status, .. } => format!(
                "Ação não permitida para parcela com status {}",
                status_label(*status)
            ),
            WorkflowError::Busy(_) => "Operação já em andamento".to_string(),
            WorkflowError::UnknownInstallment(id) => format!("Parcela {} não encontrada", id),
        }
    }

    /// Metrics outcome label.
    pub fn outcome(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "invalid",
            WorkflowError::Collaborator(_) => "failed",
            WorkflowError::Refused { .. } => "refused",
            WorkflowError::Busy(_) => "busy",
            WorkflowError::UnknownInstallment(_) => "unknown",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.display_message();
        match err {
            WorkflowError::Validation(errors) => AppError::ValidationError(errors),
            WorkflowError::Collaborator(failure) => match failure.status() {
                Some(401) => AppError::Unauthorized(anyhow::anyhow!(message)),
                Some(404) => AppError::NotFound(anyhow::anyhow!(message)),
                Some(status) if (400..500).contains(&status) => {
                    AppError::Conflict(anyhow::anyhow!(message))
                }
                _ => AppError::BadGateway(message),
            },
            WorkflowError::Refused { .. } | WorkflowError::Busy(_) => {
                AppError::Conflict(anyhow::anyhow!(message))
            }
            WorkflowError::UnknownInstallment(_) => AppError::NotFound(anyhow::anyhow!(message)),
        }
    }
}

/// Result of a workflow that asks for confirmation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The operator declined; no request was sent.
    Declined,
}
