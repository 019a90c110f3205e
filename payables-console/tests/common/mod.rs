#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use payables_console::console::{Confirmation, PayablesConsole};
use payables_console::models::forms::{CancelRequest, EditRequest, PlanRequest, SettleRequest};
use payables_console::models::{
    CreatePlanForm, GroupId, Installment, InstallmentId, InstallmentStatus, Supplier, SupplierId,
};
use payables_console::services::{CollaboratorFailure, PayablesApi, ResponseBody};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SUPPLIER_ID: SupplierId = 7;
pub const SUPPLIER_NAME: &str = "Papelaria Central";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn money(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn rejected(status: u16, detail: &str) -> CollaboratorFailure {
    CollaboratorFailure::rejected(
        status,
        Some(ResponseBody::Json(serde_json::json!({ "detail": detail }))),
    )
}

/// In-memory stand-in for the accounts-payable collaborator. It applies
/// the same business rules the real one does and records every call.
#[derive(Default)]
pub struct FakeCollaborator {
    rows: Mutex<Vec<Installment>>,
    suppliers: Mutex<Vec<Supplier>>,
    calls: Mutex<Vec<String>>,
    settle_requests: Mutex<Vec<(InstallmentId, SettleRequest)>>,
    next_id: Mutex<InstallmentId>,
    next_group: Mutex<u32>,
    fail_next_mutation: Mutex<Option<CollaboratorFailure>>,
    fail_reads: AtomicBool,
    gate: tokio::sync::Mutex<()>,
    pending: AtomicUsize,
}

impl FakeCollaborator {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        fake.suppliers.lock().unwrap().extend([
            Supplier {
                id: SUPPLIER_ID,
                name: SUPPLIER_NAME.to_string(),
                document: Some("12.345.678/0001-90".to_string()),
                status: "ATIVO".to_string(),
            },
            Supplier {
                id: 8,
                name: "Fornecedor Inativo".to_string(),
                document: None,
                status: "INATIVO".to_string(),
            },
        ]);
        Arc::new(fake)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that would have changed collaborator state.
    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list") && !c.starts_with("group") && c != "suppliers")
            .collect()
    }

    pub fn settle_requests(&self) -> Vec<(InstallmentId, SettleRequest)> {
        self.settle_requests.lock().unwrap().clone()
    }

    pub fn row(&self, id: InstallmentId) -> Option<Installment> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// Change a row behind the console's back, as another operator would.
    pub fn force_status(&self, id: InstallmentId, status: InstallmentStatus) {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.status = status;
        }
    }

    pub fn set_payment_method(&self, id: InstallmentId, method: Option<&str>) {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.payment_method = method.map(str::to_string);
        }
    }

    /// A row recorded outside any plan (`codgrp` null upstream).
    pub fn add_standalone(&self, amount: &str, due_date: NaiveDate) -> InstallmentId {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.rows.lock().unwrap().push(Installment {
            id: *next_id,
            supplier_id: SUPPLIER_ID,
            supplier_name: Some(SUPPLIER_NAME.to_string()),
            group_id: GroupId::standalone(*next_id),
            sequence: 1,
            total_count: 1,
            amount: money(amount),
            due_date,
            payment_date: None,
            status: InstallmentStatus::ToPay,
            payment_method: None,
            category: None,
            document: None,
            notes: None,
            company_id: 1,
            branch_id: 1,
        });
        *next_id
    }

    pub fn fail_next_mutation(&self, failure: CollaboratorFailure) {
        *self.fail_next_mutation.lock().unwrap() = Some(failure);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Hold every mutating call until the returned guard is dropped.
    pub async fn hold_mutations(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    pub fn pending_mutations(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check_reads(&self) -> Result<(), CollaboratorFailure> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CollaboratorFailure::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn enter_mutation(&self, call: String) -> Result<(), CollaboratorFailure> {
        self.record(call);
        self.pending.fetch_add(1, Ordering::SeqCst);
        let _open = self.gate.lock().await;
        self.pending.fetch_sub(1, Ordering::SeqCst);

        match self.fail_next_mutation.lock().unwrap().take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn with_row<T>(
        &self,
        id: InstallmentId,
        f: impl FnOnce(&mut Installment) -> Result<T, CollaboratorFailure>,
    ) -> Result<T, CollaboratorFailure> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| rejected(404, "Conta não encontrada"))?;
        f(row)
    }
}

#[async_trait]
impl PayablesApi for FakeCollaborator {
    async fn list_installments(
        &self,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>, CollaboratorFailure> {
        self.record(format!("list:{}", status.map(|s| s.as_wire()).unwrap_or("*")));
        self.check_reads()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn group_installments(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Installment>, CollaboratorFailure> {
        self.record(format!("group:{}", group_id));
        self.check_reads()?;
        let mut members: Vec<Installment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.sequence);
        Ok(members)
    }

    async fn create_plan(
        &self,
        supplier_id: SupplierId,
        request: &PlanRequest,
    ) -> Result<(), CollaboratorFailure> {
        self.enter_mutation("create_plan".to_string()).await?;

        let supplier_name = self
            .suppliers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == supplier_id)
            .map(|s| s.name.clone());

        let group_id = {
            let mut next = self.next_group.lock().unwrap();
            *next += 1;
            GroupId::new(format!("grp-{}", *next))
        };

        let count = request.quantidade;
        let share = (request.vlrtotal / Decimal::from(count)).round_dp(2);
        let mut rows = self.rows.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        for sequence in 1..=count {
            *next_id += 1;
            let amount = if sequence == count {
                request.vlrtotal - share * Decimal::from(count - 1)
            } else {
                share
            };
            rows.push(Installment {
                id: *next_id,
                supplier_id,
                supplier_name: supplier_name.clone(),
                group_id: group_id.clone(),
                sequence,
                total_count: count,
                amount,
                due_date: request
                    .datven_primeira
                    .checked_add_months(Months::new(sequence - 1))
                    .unwrap(),
                payment_date: None,
                status: InstallmentStatus::ToPay,
                payment_method: request.forpag.clone(),
                category: request.catcap.clone(),
                document: request.numdoc.clone(),
                notes: request.obscap.clone(),
                company_id: 1,
                branch_id: 1,
            });
        }
        Ok(())
    }

    async fn update_installment(
        &self,
        id: InstallmentId,
        request: &EditRequest,
    ) -> Result<(), CollaboratorFailure> {
        self.enter_mutation(format!("update:{}", id)).await?;
        self.with_row(id, |row| {
            if let Some(amount) = request.vlrcap {
                row.amount = amount;
            }
            if let Some(due_date) = request.datven {
                row.due_date = due_date;
            }
            if let Some(payment_date) = request.datpag {
                row.payment_date = Some(payment_date);
            }
            Ok(())
        })
    }

    async fn settle_installment(
        &self,
        id: InstallmentId,
        request: &SettleRequest,
    ) -> Result<(), CollaboratorFailure> {
        self.enter_mutation(format!("settle:{}", id)).await?;
        self.settle_requests
            .lock()
            .unwrap()
            .push((id, request.clone()));
        self.with_row(id, |row| match row.status {
            InstallmentStatus::Paid => Err(rejected(400, "Conta já está paga")),
            InstallmentStatus::Canceled => {
                Err(rejected(400, "Conta cancelada não pode ser baixada"))
            }
            _ => {
                row.status = InstallmentStatus::Paid;
                row.payment_date = Some(request.datpag);
                if request.forpag.is_some() {
                    row.payment_method = request.forpag.clone();
                }
                if request.obscap.is_some() {
                    row.notes = request.obscap.clone();
                }
                Ok(())
            }
        })
    }

    async fn cancel_installment(
        &self,
        id: InstallmentId,
        request: &CancelRequest,
    ) -> Result<(), CollaboratorFailure> {
        self.enter_mutation(format!("cancel:{}", id)).await?;
        self.with_row(id, |row| match row.status {
            InstallmentStatus::Paid => Err(rejected(400, "Conta paga não pode ser cancelada")),
            InstallmentStatus::Canceled => Err(rejected(400, "Conta já está cancelada")),
            _ => {
                row.status = InstallmentStatus::Canceled;
                row.notes = Some(request.motivo.clone());
                Ok(())
            }
        })
    }

    async fn delete_installment(&self, id: InstallmentId) -> Result<(), CollaboratorFailure> {
        self.enter_mutation(format!("delete:{}", id)).await?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter().position(|r| r.id == id) {
            None => Err(rejected(404, "Conta não encontrada")),
            Some(index) if rows[index].status == InstallmentStatus::Paid => {
                Err(rejected(400, "Conta paga não pode ser excluída"))
            }
            Some(index) => {
                rows.remove(index);
                Ok(())
            }
        }
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, CollaboratorFailure> {
        self.record("suppliers");
        self.check_reads()?;
        Ok(self.suppliers.lock().unwrap().clone())
    }
}

/// Confirmation double that records what was asked.
pub struct Scripted {
    confirm: bool,
    answer: Option<String>,
    asked: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(confirm: bool, answer: Option<&str>) -> Self {
        Self {
            confirm,
            answer: answer.map(str::to_string),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn yes() -> Self {
        Self::new(true, None)
    }

    pub fn no() -> Self {
        Self::new(false, None)
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Confirmation for Scripted {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.confirm
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer.clone()
    }
}

pub fn console_over(fake: &Arc<FakeCollaborator>) -> PayablesConsole {
    PayablesConsole::new(fake.clone())
}

pub fn three_installment_plan() -> CreatePlanForm {
    CreatePlanForm {
        supplier_id: SUPPLIER_ID,
        total_amount: Some(money("300.00")),
        installment_count: 3,
        first_due_date: Some(date(2025, 1, 10)),
        payment_method: Some("PIX".to_string()),
        ..Default::default()
    }
}

/// Console with one freshly created three-installment plan loaded.
pub async fn console_with_plan(fake: &Arc<FakeCollaborator>) -> PayablesConsole {
    let console = console_over(fake);
    console
        .create_plan(&three_installment_plan())
        .await
        .expect("Failed to create plan");
    console
}
