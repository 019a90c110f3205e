//! Installment status machine: which operator actions are legal where.
//!
//! `Overdue` is only ever asserted by the collaborator. `Paid` and
//! `Canceled` are terminal.

use crate::console::error::WorkflowError;
use crate::models::{EditForm, Installment, InstallmentStatus};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Settle,
    EarlySettle,
    Cancel,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Settle => "settle",
            Action::EarlySettle => "early_settle",
            Action::Cancel => "cancel",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controls offered for one installment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActionSet {
    pub settle: bool,
    pub early_settle: bool,
    pub cancel: bool,
    pub edit: bool,
    pub delete: bool,
}

impl ActionSet {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Settle => self.settle,
            Action::EarlySettle => self.early_settle,
            Action::Cancel => self.cancel,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }
}

pub fn available_actions(installment: &Installment) -> ActionSet {
    let status = installment.status;
    let open = matches!(status, InstallmentStatus::ToPay | InstallmentStatus::Overdue);

    ActionSet {
        settle: open,
        early_settle: status == InstallmentStatus::ToPay,
        cancel: open,
        edit: true,
        delete: status != InstallmentStatus::Paid,
    }
}

pub fn ensure_allowed(action: Action, installment: &Installment) -> Result<(), WorkflowError> {
    if available_actions(installment).allows(action) {
        Ok(())
    } else {
        Err(refused(action, installment))
    }
}

/// Field-level edit rules on top of `ensure_allowed(Edit)`: the amount of a
/// settled or canceled installment is frozen, and only a paid installment
/// may carry a payment date.
pub fn ensure_edit_allowed(installment: &Installment, form: &EditForm) -> Result<(), WorkflowError> {
    ensure_allowed(Action::Edit, installment)?;

    if form.amount.is_some() && installment.status.is_terminal() {
        return Err(refused(Action::Edit, installment));
    }
    if form.payment_date.is_some() && installment.status != InstallmentStatus::Paid {
        return Err(refused(Action::Edit, installment));
    }
    Ok(())
}

fn refused(action: Action, installment: &Installment) -> WorkflowError {
    WorkflowError::Refused {
        action,
        id: installment.id,
        status: installment.status,
    }
}
