//! Operator confirmations for destructive or irreversible actions.

pub const EARLY_SETTLE_QUESTION: &str = "Deseja dar baixa antecipada nesta parcela?";
pub const CANCEL_QUESTION: &str = "Deseja realmente cancelar esta conta?";
pub const CANCEL_REASON_PROMPT: &str = "Motivo do cancelamento:";
pub const DELETE_QUESTION: &str = "Deseja realmente excluir esta conta?";

/// Asked before a request is issued. Declining means nothing is sent.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    /// Free-text answer, `None` when the operator dismisses the prompt.
    fn prompt(&self, message: &str) -> Option<String>;
}

/// Answers collected by the browser before the request reached us.
#[derive(Debug, Clone, Default)]
pub struct PreAnswered {
    pub confirmed: bool,
    pub answer: Option<String>,
}

impl PreAnswered {
    pub fn new(confirmed: bool, answer: Option<String>) -> Self {
        Self { confirmed, answer }
    }
}

impl Confirmation for PreAnswered {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!(question = message, confirmed = self.confirmed, "Confirmation answered");
        self.confirmed
    }

    fn prompt(&self, _message: &str) -> Option<String> {
        self.answer.clone()
    }
}
