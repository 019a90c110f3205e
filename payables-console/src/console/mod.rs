//! The installment & settlement console.
//!
//! `PayablesConsole` owns one operator's view state: the summary list (as
//! last confirmed by the collaborator), the status filter, expanded group
//! buffers, the supplier list and the banner. Every mutation goes through
//! the collaborator first; local state only changes by re-reading
//! authoritative data afterwards.

pub mod confirm;
pub mod detail;
pub mod error;
pub mod grouping;
pub mod in_flight;
pub mod transitions;
pub mod view;

pub use confirm::{Confirmation, PreAnswered};
pub use detail::{DetailBuffer, GroupDetails};
pub use error::{Outcome, WorkflowError};
pub use grouping::{group_installments, Plan, PlanIndex};
pub use in_flight::{InFlight, InFlightKey};
pub use transitions::{available_actions, Action, ActionSet};
pub use view::{Banner, BannerKind, ConsoleView, SupplierView};

use crate::models::forms::SettleRequest;
use crate::models::{
    CancelForm, CreatePlanForm, EditForm, GroupId, Installment, InstallmentId, InstallmentStatus,
    SettleForm, Supplier,
};
use crate::services::metrics::record_workflow_action;
use crate::services::{CollaboratorFailure, PayablesApi};
use crate::utils::error_message::normalize_failure;
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::ValidationErrors;

pub const EARLY_SETTLE_NOTES: &str = "Baixa antecipada";
pub const DEFAULT_PAYMENT_METHOD: &str = "DINHEIRO";

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Default)]
struct ConsoleState {
    summary: Vec<Installment>,
    summary_ticket: u64,
    status_filter: Option<InstallmentStatus>,
    suppliers: Vec<Supplier>,
    details: GroupDetails,
    banner: Option<Banner>,
}

pub struct PayablesConsole {
    api: Arc<dyn PayablesApi>,
    state: RwLock<ConsoleState>,
    in_flight: InFlight,
    today: Clock,
}

impl PayablesConsole {
    pub fn new(api: Arc<dyn PayablesApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ConsoleState::default()),
            in_flight: InFlight::new(),
            today: Arc::new(|| chrono::Utc::now().date_naive()),
        }
    }

    /// Replace the calendar used for early settlement dates (UTC by default).
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    // ---- read side ----

    pub async fn view(&self) -> ConsoleView {
        let state = self.state.read().await;
        let index = group_installments(&state.summary);

        ConsoleView {
            status_filter: state.status_filter,
            banner: state.banner.clone(),
            creating_plan: self.in_flight.is_held(InFlightKey::PlanCreation),
            plans: view::plan_views(&index, &state.details, &self.in_flight),
        }
    }

    pub async fn summary(&self) -> Vec<Installment> {
        self.state.read().await.summary.clone()
    }

    /// Plans regrouped from the current summary.
    pub async fn plans(&self) -> PlanIndex {
        group_installments(&self.state.read().await.summary)
    }

    pub async fn detail(&self, group_id: &GroupId) -> Option<DetailBuffer> {
        self.state.read().await.details.buffer(group_id).cloned()
    }

    pub async fn suppliers(&self) -> Vec<Supplier> {
        self.state.read().await.suppliers.clone()
    }

    pub async fn banner(&self) -> Option<Banner> {
        self.state.read().await.banner.clone()
    }

    pub async fn status_filter(&self) -> Option<InstallmentStatus> {
        self.state.read().await.status_filter
    }

    pub async fn dismiss_banner(&self) {
        self.state.write().await.banner = None;
    }

    // ---- loading ----

    /// Reload the summary list under the current filter, then every expanded
    /// group. On failure the previous list is kept and the error banner is
    /// raised.
    pub async fn load_summary(&self) -> Result<(), WorkflowError> {
        if let Err(failure) = self.reload_summary().await {
            self.set_banner(Banner::error(normalize_failure(&failure))).await;
            return Err(failure.into());
        }
        self.reload_expanded_groups().await;
        Ok(())
    }

    pub async fn set_status_filter(
        &self,
        status: Option<InstallmentStatus>,
    ) -> Result<(), WorkflowError> {
        self.state.write().await.status_filter = status;
        tracing::debug!(status = ?status, "Status filter changed");
        self.load_summary().await
    }

    /// Active suppliers for the plan form. A failure keeps the previous list.
    pub async fn refresh_suppliers(&self) {
        match self.api.list_suppliers().await {
            Ok(suppliers) => {
                let active: Vec<Supplier> =
                    suppliers.into_iter().filter(Supplier::is_active).collect();
                tracing::debug!(count = active.len(), "Loaded suppliers");
                self.state.write().await.suppliers = active;
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "Failed to load suppliers; keeping previous list");
            }
        }
    }

    pub async fn expand(&self, group_id: &GroupId) -> Result<(), WorkflowError> {
        let ticket = self.state.write().await.details.begin_load(group_id);
        self.load_detail(group_id, ticket).await
    }

    pub async fn collapse(&self, group_id: &GroupId) -> bool {
        self.state.write().await.details.collapse(group_id)
    }

    /// Expand a collapsed group or collapse an expanded one. Returns whether
    /// the group is expanded afterwards.
    pub async fn toggle_group(&self, group_id: &GroupId) -> Result<bool, WorkflowError> {
        let ticket = {
            let mut state = self.state.write().await;
            if state.details.collapse(group_id) {
                return Ok(false);
            }
            state.details.begin_load(group_id)
        };

        self.load_detail(group_id, ticket).await?;
        Ok(true)
    }

    // ---- workflows ----

    pub async fn create_plan(&self, form: &CreatePlanForm) -> Result<(), WorkflowError> {
        let result = self.run_create_plan(form).await;
        record("create_plan", result.as_ref().map(|_| Outcome::Completed));
        result
    }

    pub async fn settle(&self, id: InstallmentId, form: &SettleForm) -> Result<(), WorkflowError> {
        let result = self.run_settle(id, form).await;
        record(Action::Settle.as_str(), result.as_ref().map(|_| Outcome::Completed));
        result
    }

    /// Settle today with the installment's own payment method.
    pub async fn early_settle(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let result = self.run_early_settle(id, confirmation).await;
        record(Action::EarlySettle.as_str(), result.as_ref().copied());
        result
    }

    pub async fn cancel(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let result = self.run_cancel(id, confirmation).await;
        record(Action::Cancel.as_str(), result.as_ref().copied());
        result
    }

    pub async fn edit(&self, id: InstallmentId, form: &EditForm) -> Result<(), WorkflowError> {
        let result = self.run_edit(id, form).await;
        record(Action::Edit.as_str(), result.as_ref().map(|_| Outcome::Completed));
        result
    }

    pub async fn delete(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let result = self.run_delete(id, confirmation).await;
        record(Action::Delete.as_str(), result.as_ref().copied());
        result
    }

    async fn run_create_plan(&self, form: &CreatePlanForm) -> Result<(), WorkflowError> {
        form.check()?;
        let request = require(form.to_request())?;
        let message = format!(
            "Parcelamento criado com sucesso! {} parcelas geradas.",
            request.quantidade
        );

        self.mutate(
            InFlightKey::PlanCreation,
            None,
            message,
            self.api.create_plan(form.supplier_id, &request),
        )
        .await
    }

    async fn run_settle(&self, id: InstallmentId, form: &SettleForm) -> Result<(), WorkflowError> {
        let installment = self.lookup(id).await?;
        transitions::ensure_allowed(Action::Settle, &installment)?;
        form.check()?;
        let request = require(form.to_request())?;

        self.mutate(
            InFlightKey::Installment(id),
            Some(installment.group_id),
            "Conta baixada com sucesso!".to_string(),
            self.api.settle_installment(id, &request),
        )
        .await
    }

    async fn run_early_settle(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let installment = self.lookup(id).await?;
        transitions::ensure_allowed(Action::EarlySettle, &installment)?;
        if !confirmation.confirm(confirm::EARLY_SETTLE_QUESTION) {
            return Ok(Outcome::Declined);
        }

        let payment_method = installment
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
            .to_string();
        let request = SettleRequest {
            datpag: (self.today)(),
            forpag: Some(payment_method),
            obscap: Some(EARLY_SETTLE_NOTES.to_string()),
        };

        self.mutate(
            InFlightKey::Installment(id),
            Some(installment.group_id),
            "Baixa antecipada realizada com sucesso!".to_string(),
            self.api.settle_installment(id, &request),
        )
        .await?;
        Ok(Outcome::Completed)
    }

    async fn run_cancel(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let installment = self.lookup(id).await?;
        transitions::ensure_allowed(Action::Cancel, &installment)?;
        if !confirmation.confirm(confirm::CANCEL_QUESTION) {
            return Ok(Outcome::Declined);
        }
        let reason = match confirmation.prompt(confirm::CANCEL_REASON_PROMPT) {
            Some(reason) if !reason.is_empty() => reason,
            _ => return Ok(Outcome::Declined),
        };

        let form = CancelForm::new(reason);
        form.check()?;

        self.mutate(
            InFlightKey::Installment(id),
            Some(installment.group_id),
            "Conta cancelada com sucesso!".to_string(),
            self.api.cancel_installment(id, &form.to_request()),
        )
        .await?;
        Ok(Outcome::Completed)
    }

    async fn run_edit(&self, id: InstallmentId, form: &EditForm) -> Result<(), WorkflowError> {
        let installment = self.lookup(id).await?;
        form.check()?;
        transitions::ensure_edit_allowed(&installment, form)?;

        self.mutate(
            InFlightKey::Installment(id),
            Some(installment.group_id),
            "Parcela atualizada com sucesso!".to_string(),
            self.api.update_installment(id, &form.to_request()),
        )
        .await
    }

    async fn run_delete(
        &self,
        id: InstallmentId,
        confirmation: &dyn Confirmation,
    ) -> Result<Outcome, WorkflowError> {
        let installment = self.lookup(id).await?;
        transitions::ensure_allowed(Action::Delete, &installment)?;
        if !confirmation.confirm(confirm::DELETE_QUESTION) {
            return Ok(Outcome::Declined);
        }

        self.mutate(
            InFlightKey::Installment(id),
            Some(installment.group_id),
            "Conta excluída com sucesso!".to_string(),
            self.api.delete_installment(id),
        )
        .await?;
        Ok(Outcome::Completed)
    }

    // ---- internals ----

    async fn set_banner(&self, banner: Banner) {
        self.state.write().await.banner = Some(banner);
    }

    /// The summary row wins; a detail buffer only answers for rows the
    /// status filter hides.
    async fn lookup(&self, id: InstallmentId) -> Result<Installment, WorkflowError> {
        let state = self.state.read().await;
        state
            .summary
            .iter()
            .find(|i| i.id == id)
            .or_else(|| state.details.find(id))
            .cloned()
            .ok_or(WorkflowError::UnknownInstallment(id))
    }

    /// Issue one mutating request under the in-flight guard, then re-read
    /// authoritative state whatever the outcome.
    async fn mutate<F>(
        &self,
        key: InFlightKey,
        group_id: Option<GroupId>,
        success_message: String,
        request: F,
    ) -> Result<(), WorkflowError>
    where
        F: Future<Output = Result<(), CollaboratorFailure>>,
    {
        let _guard = self
            .in_flight
            .try_acquire(key)
            .ok_or(WorkflowError::Busy(key))?;

        let result = request.await;
        let banner = match &result {
            Ok(()) => Banner::success(success_message),
            Err(failure) => {
                tracing::warn!(target_key = %key, error = %failure, "Collaborator rejected action");
                Banner::error(normalize_failure(failure))
            }
        };
        self.set_banner(banner).await;
        self.refresh_after_mutation(group_id.as_ref()).await;

        result.map_err(WorkflowError::from)
    }

    async fn refresh_after_mutation(&self, group_id: Option<&GroupId>) {
        if let Err(failure) = self.reload_summary().await {
            tracing::warn!(error = %failure, "Summary refresh after mutation failed");
        }

        let Some(group_id) = group_id else {
            return;
        };
        let ticket = {
            let mut state = self.state.write().await;
            if !state.details.is_expanded(group_id) {
                return;
            }
            state.details.begin_load(group_id)
        };
        if let Err(e) = self.load_detail(group_id, ticket).await {
            tracing::warn!(group_id = %group_id, error = %e, "Detail refresh after mutation failed");
        }
    }

    /// A row without a plan has nothing to fetch; its detail is the
    /// summary row itself.
    async fn standalone_members(&self, group_id: &GroupId) -> Vec<Installment> {
        self.state
            .read()
            .await
            .summary
            .iter()
            .filter(|i| &i.group_id == group_id)
            .cloned()
            .collect()
    }

    async fn reload_expanded_groups(&self) {
        let pending: Vec<(GroupId, u64)> = {
            let mut state = self.state.write().await;
            let groups: Vec<GroupId> = state.details.expanded_groups().cloned().collect();
            groups
                .into_iter()
                .map(|group_id| {
                    let ticket = state.details.begin_load(&group_id);
                    (group_id, ticket)
                })
                .collect()
        };

        for (group_id, ticket) in pending {
            if let Err(e) = self.load_detail(&group_id, ticket).await {
                tracing::warn!(group_id = %group_id, error = %e, "Detail refresh after summary load failed");
            }
        }
    }

    async fn reload_summary(&self) -> Result<(), CollaboratorFailure> {
        let (filter, ticket) = {
            let mut state = self.state.write().await;
            state.summary_ticket += 1;
            (state.status_filter, state.summary_ticket)
        };

        let rows = self.api.list_installments(filter).await?;

        let mut state = self.state.write().await;
        if state.summary_ticket == ticket {
            state.summary = rows;
        } else {
            tracing::debug!("Discarding superseded summary load");
        }
        Ok(())
    }

    async fn load_detail(&self, group_id: &GroupId, ticket: u64) -> Result<(), WorkflowError> {
        let result = if group_id.is_standalone() {
            Ok(self.standalone_members(group_id).await)
        } else {
            self.api.group_installments(group_id).await
        };

        let mut state = self.state.write().await;
        match result {
            Ok(members) => {
                if !state.details.finish_load(group_id, ticket, Ok(members)) {
                    tracing::debug!(group_id = %group_id, "Discarding stale detail load");
                }
                Ok(())
            }
            Err(failure) => {
                let message = normalize_failure(&failure);
                if state.details.finish_load(group_id, ticket, Err(message.clone())) {
                    state.banner = Some(Banner::error(message));
                }
                Err(failure.into())
            }
        }
    }
}

/// A form that passed `check` always yields its request.
fn require<T>(request: Option<T>) -> Result<T, WorkflowError> {
    request.ok_or_else(|| WorkflowError::Validation(ValidationErrors::new()))
}

fn record(action: &str, result: Result<Outcome, &WorkflowError>) {
    let outcome = match result {
        Ok(Outcome::Completed) => "completed",
        Ok(Outcome::Declined) => "declined",
        Err(err) => err.outcome(),
    };
    record_workflow_action(action, outcome);
}
