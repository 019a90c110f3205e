//! Accounts-payable collaborator client.
//!
//! Every call carries the operator's bearer credential and the current
//! trace context. Mutations report success or failure only; the console
//! re-reads authoritative state afterwards instead of trusting the
//! mutation's response body.

use crate::config::CollaboratorSettings;
use crate::models::forms::{CancelRequest, EditRequest, PlanRequest, SettleRequest};
use crate::models::{GroupId, Installment, InstallmentId, InstallmentStatus, Supplier, SupplierId};
use crate::services::failure::{check_status, CollaboratorFailure};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use service_core::observability::{TracedClientExt, TracedRequest};

const PAYABLES_PATH: &str = "/contas-pagar";
const REGISTRATIONS_PATH: &str = "/cadastros-gerais";

/// Operations the console needs from the collaborator.
#[async_trait]
pub trait PayablesApi: Send + Sync {
    /// Tenant-scoped summary list, optionally filtered by status.
    async fn list_installments(
        &self,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>, CollaboratorFailure>;

    /// Ordered member list of one plan.
    async fn group_installments(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Installment>, CollaboratorFailure>;

    async fn create_plan(
        &self,
        supplier_id: SupplierId,
        request: &PlanRequest,
    ) -> Result<(), CollaboratorFailure>;

    async fn update_installment(
        &self,
        id: InstallmentId,
        request: &EditRequest,
    ) -> Result<(), CollaboratorFailure>;

    async fn settle_installment(
        &self,
        id: InstallmentId,
        request: &SettleRequest,
    ) -> Result<(), CollaboratorFailure>;

    async fn cancel_installment(
        &self,
        id: InstallmentId,
        request: &CancelRequest,
    ) -> Result<(), CollaboratorFailure>;

    async fn delete_installment(&self, id: InstallmentId) -> Result<(), CollaboratorFailure>;

    /// Active suppliers, for the plan-creation form.
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, CollaboratorFailure>;
}

pub struct PayablesClient {
    client: Client,
    settings: CollaboratorSettings,
    access_token: Secret<String>,
}

impl PayablesClient {
    pub fn new(settings: CollaboratorSettings, access_token: Secret<String>) -> Self {
        Self {
            client: Client::new(),
            settings,
            access_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: TracedRequest) -> Result<reqwest::Response, CollaboratorFailure> {
        let response = request
            .bearer_auth(self.access_token.expose_secret())
            .timeout(self.settings.request_timeout())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Collaborator request failed");
                CollaboratorFailure::from(e)
            })?;

        check_status(response).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: TracedRequest,
    ) -> Result<T, CollaboratorFailure> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CollaboratorFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl PayablesApi for PayablesClient {
    async fn list_installments(
        &self,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>, CollaboratorFailure> {
        let mut request = self.client.traced_get(&self.url(PAYABLES_PATH));
        if let Some(status) = status {
            request = request.query(&[("statcap", status.as_wire())]);
        }

        let installments: Vec<Installment> = self.fetch(request).await?;
        tracing::debug!(count = installments.len(), status = ?status, "Loaded payables summary");
        Ok(installments)
    }

    async fn group_installments(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Installment>, CollaboratorFailure> {
        let url = self.url(&format!("{}/grupo/{}", PAYABLES_PATH, group_id));
        let members: Vec<Installment> = self.fetch(self.client.traced_get(&url)).await?;
        tracing::debug!(group_id = %group_id, count = members.len(), "Loaded plan detail");
        Ok(members)
    }

    async fn create_plan(
        &self,
        supplier_id: SupplierId,
        request: &PlanRequest,
    ) -> Result<(), CollaboratorFailure> {
        let url = self.url(&format!("{}/parcelar/{}", PAYABLES_PATH, supplier_id));
        self.send(self.client.traced_post(&url).json(request)).await?;
        tracing::info!(
            supplier_id,
            installments = request.quantidade,
            total = %request.vlrtotal,
            "Plan created"
        );
        Ok(())
    }

    async fn update_installment(
        &self,
        id: InstallmentId,
        request: &EditRequest,
    ) -> Result<(), CollaboratorFailure> {
        let url = self.url(&format!("{}/{}", PAYABLES_PATH, id));
        self.send(self.client.traced_put(&url).json(request)).await?;
        tracing::info!(installment_id = id, "Installment updated");
        Ok(())
    }

    async fn settle_installment(
        &self,
        id: InstallmentId,
        request: &SettleRequest,
    ) -> Result<(), CollaboratorFailure> {
        let url = self.url(&format!("{}/{}/baixar", PAYABLES_PATH, id));
        self.send(self.client.traced_post(&url).json(request)).await?;
        tracing::info!(installment_id = id, payment_date = %request.datpag, "Installment settled");
        Ok(())
    }

    async fn cancel_installment(
        &self,
        id: InstallmentId,
        request: &CancelRequest,
    ) -> Result<(), CollaboratorFailure> {
        let url = self.url(&format!("{}/{}/cancelar", PAYABLES_PATH, id));
        self.send(self.client.traced_post(&url).json(request)).await?;
        tracing::info!(installment_id = id, "Installment canceled");
        Ok(())
    }

    async fn delete_installment(&self, id: InstallmentId) -> Result<(), CollaboratorFailure> {
        let url = self.url(&format!("{}/{}", PAYABLES_PATH, id));
        self.send(self.client.traced_delete(&url)).await?;
        tracing::info!(installment_id = id, "Installment deleted");
        Ok(())
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, CollaboratorFailure> {
        let request = self
            .client
            .traced_get(&self.url(REGISTRATIONS_PATH))
            .query(&[("tipocad", "FORNECEDOR"), ("statcad", "ATIVO")]);
        self.fetch(request).await
    }
}
