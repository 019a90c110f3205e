//! JSON view models served to the browser.

use crate::console::detail::{DetailBuffer, GroupDetails};
use crate::console::grouping::{Plan, PlanIndex};
use crate::console::in_flight::{InFlight, InFlightKey};
use crate::console::transitions::{available_actions, ActionSet};
use crate::models::{GroupId, Installment, InstallmentId, InstallmentStatus, Supplier};
use crate::utils::format::{format_currency, format_date, status_badge_class, status_label};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Error,
}

/// Dismissible message shown above the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleView {
    pub status_filter: Option<InstallmentStatus>,
    pub banner: Option<Banner>,
    pub creating_plan: bool,
    pub plans: Vec<PlanView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub group_id: GroupId,
    pub supplier: String,
    pub total_amount: Decimal,
    pub total_amount_label: String,
    pub paid_count: usize,
    pub total_count: usize,
    pub progress: f64,
    pub progress_label: String,
    pub expanded: bool,
    pub representative: Option<InstallmentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    Loading,
    Ready { members: Vec<InstallmentView> },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallmentView {
    pub id: InstallmentId,
    pub sequence: u32,
    pub total_count: u32,
    pub amount: Decimal,
    pub amount_label: String,
    pub due_date: NaiveDate,
    pub due_date_label: String,
    pub payment_date: Option<NaiveDate>,
    pub payment_date_label: String,
    pub status: InstallmentStatus,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub payment_method: Option<String>,
    pub category: Option<String>,
    pub document: Option<String>,
    pub notes: Option<String>,
    pub actions: ActionSet,
    pub busy: bool,
}

impl InstallmentView {
    pub fn new(installment: &Installment, busy: bool) -> Self {
        // A row with a request in flight offers nothing until it settles.
        let actions = if busy {
            ActionSet::default()
        } else {
            available_actions(installment)
        };

        Self {
            id: installment.id,
            sequence: installment.sequence,
            total_count: installment.total_count,
            amount: installment.amount,
            amount_label: format_currency(installment.amount),
            due_date: installment.due_date,
            due_date_label: format_date(Some(installment.due_date)),
            payment_date: installment.payment_date,
            payment_date_label: format_date(installment.payment_date),
            status: installment.status,
            status_label: status_label(installment.status),
            status_class: status_badge_class(installment.status),
            payment_method: installment.payment_method.clone(),
            category: installment.category.clone(),
            document: installment.document.clone(),
            notes: installment.notes.clone(),
            actions,
            busy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierView {
    pub id: i64,
    pub name: String,
    pub document: Option<String>,
}

impl From<&Supplier> for SupplierView {
    fn from(supplier: &Supplier) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name.clone(),
            document: supplier.document.clone(),
        }
    }
}

pub(crate) fn plan_view(plan: &Plan, details: &GroupDetails, in_flight: &InFlight) -> PlanView {
    let row = |m: &Installment| {
        InstallmentView::new(m, in_flight.is_held(InFlightKey::Installment(m.id)))
    };

    let detail = details.buffer(&plan.group_id).map(|buffer| match buffer {
        DetailBuffer::Loading => DetailView::Loading,
        DetailBuffer::Ready(members) => DetailView::Ready {
            members: members.iter().map(row).collect(),
        },
        DetailBuffer::Failed(message) => DetailView::Failed {
            message: message.clone(),
        },
    });

    let representative = plan.representative();

    PlanView {
        group_id: plan.group_id.clone(),
        supplier: representative
            .map(Installment::supplier_label)
            .unwrap_or_default(),
        total_amount: plan.total_amount,
        total_amount_label: format_currency(plan.total_amount),
        paid_count: plan.paid_count,
        total_count: plan.total_count,
        progress: plan.progress(),
        progress_label: format!("{}/{}", plan.paid_count, plan.total_count),
        expanded: detail.is_some(),
        representative: representative.map(row),
        detail,
    }
}

pub(crate) fn plan_views(
    index: &PlanIndex,
    details: &GroupDetails,
    in_flight: &InFlight,
) -> Vec<PlanView> {
    index
        .plans()
        .map(|plan| plan_view(plan, details, in_flight))
        .collect()
}
