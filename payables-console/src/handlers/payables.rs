//! JSON endpoints over the operator's console.
//!
//! Every handler answers with the refreshed console view so the page can
//! re-render from a single payload.

use crate::console::{ConsoleView, Outcome, PreAnswered, SupplierView};
use crate::models::user::Operator;
use crate::models::{
    CreatePlanForm, EditForm, GroupId, InstallmentId, InstallmentStatus, SettleForm,
};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Serialize)]
pub struct ActionResponse {
    pub outcome: &'static str,
    pub view: ConsoleView,
}

impl ActionResponse {
    async fn new(outcome: Outcome, operator: &Operator) -> Self {
        Self {
            outcome: match outcome {
                Outcome::Completed => "completed",
                Outcome::Declined => "declined",
            },
            view: operator.console.view().await,
        }
    }
}

/// Answers to the confirmation dialog, collected by the page.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelParams {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub status: Option<InstallmentStatus>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub expanded: bool,
    pub view: ConsoleView,
}

pub async fn get_console(operator: Operator) -> Json<ConsoleView> {
    Json(operator.console.view().await)
}

pub async fn refresh_console(operator: Operator) -> Result<Json<ConsoleView>, AppError> {
    operator.console.load_summary().await?;
    Ok(Json(operator.console.view().await))
}

pub async fn set_filter(
    operator: Operator,
    Json(payload): Json<FilterRequest>,
) -> Result<Json<ConsoleView>, AppError> {
    operator.console.set_status_filter(payload.status).await?;
    Ok(Json(operator.console.view().await))
}

pub async fn toggle_group(
    operator: Operator,
    Path(group_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let expanded = operator
        .console
        .toggle_group(&GroupId::new(group_id))
        .await?;

    Ok(Json(ToggleResponse {
        expanded,
        view: operator.console.view().await,
    }))
}

pub async fn create_plan(
    operator: Operator,
    Json(form): Json<CreatePlanForm>,
) -> Result<(StatusCode, Json<ConsoleView>), AppError> {
    operator.console.create_plan(&form).await?;
    tracing::info!(
        username = %operator.username,
        supplier_id = form.supplier_id,
        "Plan submitted"
    );
    Ok((StatusCode::CREATED, Json(operator.console.view().await)))
}

pub async fn settle(
    operator: Operator,
    Path(id): Path<InstallmentId>,
    Json(form): Json<SettleForm>,
) -> Result<Json<ConsoleView>, AppError> {
    operator.console.settle(id, &form).await?;
    Ok(Json(operator.console.view().await))
}

pub async fn early_settle(
    operator: Operator,
    Path(id): Path<InstallmentId>,
    Json(params): Json<ConfirmParams>,
) -> Result<Json<ActionResponse>, AppError> {
    let answers = PreAnswered::new(params.confirmed, None);
    let outcome = operator.console.early_settle(id, &answers).await?;
    Ok(Json(ActionResponse::new(outcome, &operator).await))
}

pub async fn cancel(
    operator: Operator,
    Path(id): Path<InstallmentId>,
    Json(params): Json<CancelParams>,
) -> Result<Json<ActionResponse>, AppError> {
    let answers = PreAnswered::new(params.confirmed, params.reason);
    let outcome = operator.console.cancel(id, &answers).await?;
    Ok(Json(ActionResponse::new(outcome, &operator).await))
}

pub async fn edit(
    operator: Operator,
    Path(id): Path<InstallmentId>,
    Json(form): Json<EditForm>,
) -> Result<Json<ConsoleView>, AppError> {
    operator.console.edit(id, &form).await?;
    Ok(Json(operator.console.view().await))
}

pub async fn delete(
    operator: Operator,
    Path(id): Path<InstallmentId>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ActionResponse>, AppError> {
    let answers = PreAnswered::new(params.confirmed, None);
    let outcome = operator.console.delete(id, &answers).await?;
    Ok(Json(ActionResponse::new(outcome, &operator).await))
}

pub async fn list_suppliers(operator: Operator) -> Json<Vec<SupplierView>> {
    let suppliers = operator.console.suppliers().await;
    Json(suppliers.iter().map(SupplierView::from).collect())
}

pub async fn refresh_suppliers(operator: Operator) -> Json<Vec<SupplierView>> {
    operator.console.refresh_suppliers().await;
    list_suppliers(operator).await
}

pub async fn dismiss_banner(operator: Operator) -> StatusCode {
    operator.console.dismiss_banner().await;
    StatusCode::NO_CONTENT
}
