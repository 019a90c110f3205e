//! Operator input for the payables workflows and the request bodies they
//! become on the wire.
//!
//! Validation here is presence/positivity only. Amount splitting and due
//! date scheduling are the collaborator's job.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Run the derived validators, then the checks the derive cannot express.
fn collect(
    derived: Result<(), ValidationErrors>,
    extra: impl FnOnce(&mut ValidationErrors),
) -> Result<(), ValidationErrors> {
    let mut errors = derived.err().unwrap_or_else(ValidationErrors::new);
    extra(&mut errors);

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePlanForm {
    #[validate(range(min = 1, message = "Selecione um fornecedor válido"))]
    #[serde(default)]
    pub supplier_id: i64,
    #[validate(required(message = "Informe um valor total válido"))]
    pub total_amount: Option<Decimal>,
    #[validate(range(min = 1, message = "A quantidade de parcelas deve ser no mínimo 1"))]
    #[serde(default = "default_installment_count")]
    pub installment_count: u32,
    #[validate(required(message = "Informe a data de vencimento da primeira parcela"))]
    pub first_due_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub payment_method: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub document: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_installment_count() -> u32 {
    1
}

impl CreatePlanForm {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        collect(self.validate(), |errors| {
            if matches!(self.total_amount, Some(amount) if amount <= Decimal::ZERO) {
                errors.add(
                    "total_amount",
                    error("positive", "Informe um valor total válido"),
                );
            }
        })
    }

    /// Body for `POST /contas-pagar/parcelar/{supplierId}`. Call after `check`.
    pub fn to_request(&self) -> Option<PlanRequest> {
        Some(PlanRequest {
            vlrtotal: self.total_amount?,
            quantidade: self.installment_count,
            datven_primeira: self.first_due_date?,
            catcap: blank_to_none(&self.category),
            forpag: blank_to_none(&self.payment_method),
            obscap: blank_to_none(&self.notes),
            numdoc: blank_to_none(&self.document),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRequest {
    pub vlrtotal: Decimal,
    pub quantidade: u32,
    pub datven_primeira: NaiveDate,
    pub catcap: Option<String>,
    pub forpag: Option<String>,
    pub obscap: Option<String>,
    pub numdoc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SettleForm {
    #[validate(required(message = "Informe a data de pagamento"))]
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub payment_method: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: Option<String>,
}

impl SettleForm {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        collect(self.validate(), |_| {})
    }

    pub fn to_request(&self) -> Option<SettleRequest> {
        Some(SettleRequest {
            datpag: self.payment_date?,
            forpag: blank_to_none(&self.payment_method),
            obscap: blank_to_none(&self.notes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettleRequest {
    pub datpag: NaiveDate,
    pub forpag: Option<String>,
    pub obscap: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditForm {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

impl EditForm {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        collect(self.validate(), |errors| {
            if self.amount.is_none() && self.due_date.is_none() && self.payment_date.is_none() {
                errors.add("__all__", error("empty", "Nenhuma alteração informada"));
            }
            if matches!(self.amount, Some(amount) if amount <= Decimal::ZERO) {
                errors.add("amount", error("positive", "Informe um valor válido"));
            }
        })
    }

    pub fn to_request(&self) -> EditRequest {
        EditRequest {
            vlrcap: self.amount,
            datven: self.due_date,
            datpag: self.payment_date,
        }
    }
}

/// Absent fields are omitted so the collaborator leaves them untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlrcap: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datven: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datpag: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelForm {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Informe o motivo do cancelamento"
    ))]
    pub reason: String,
}

impl CancelForm {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        collect(self.validate(), |errors| {
            if !self.reason.is_empty() && self.reason.trim().is_empty() {
                errors.add(
                    "reason",
                    error("blank", "Informe o motivo do cancelamento"),
                );
            }
        })
    }

    pub fn to_request(&self) -> CancelRequest {
        CancelRequest {
            motivo: self.reason.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelRequest {
    pub motivo: String,
}
