//! Accounts-payable installment as served by the collaborator.

use crate::utils::wire;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

pub type InstallmentId = i64;
pub type SupplierId = i64;

/// Installment status. `Overdue` is asserted upstream once the due date
/// has passed on an unsettled installment; it is never derived locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    #[serde(rename = "A_PAGAR")]
    ToPay,
    #[serde(rename = "VENCIDO")]
    Overdue,
    #[serde(rename = "PAGO")]
    Paid,
    #[serde(rename = "CANCELADO")]
    Canceled,
}

impl InstallmentStatus {
    pub const ALL: [InstallmentStatus; 4] = [
        InstallmentStatus::ToPay,
        InstallmentStatus::Overdue,
        InstallmentStatus::Paid,
        InstallmentStatus::Canceled,
    ];

    pub fn as_wire(&self) -> &'static str {
        match self {
            InstallmentStatus::ToPay => "A_PAGAR",
            InstallmentStatus::Overdue => "VENCIDO",
            InstallmentStatus::Paid => "PAGO",
            InstallmentStatus::Canceled => "CANCELADO",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_wire() == s)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallmentStatus::Paid | InstallmentStatus::Canceled)
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Plan (installment group) identifier. Upstream sends UUID strings, older
/// rows carry integers; both normalise to the same opaque string. A row
/// without a plan gets a standalone id of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(String);

const STANDALONE_PREFIX: &str = "single-";

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Single-member plan for an installment that has no `codgrp`.
    pub fn standalone(id: InstallmentId) -> Self {
        Self(format!("{}{}", STANDALONE_PREFIX, id))
    }

    /// Standalone plans have no upstream group to fetch.
    pub fn is_standalone(&self) -> bool {
        self.0.starts_with(STANDALONE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupId {
    Text(String),
    Number(i64),
}

impl RawGroupId {
    fn into_group_id(self) -> Option<GroupId> {
        match self {
            RawGroupId::Text(text) if text.trim().is_empty() => None,
            RawGroupId::Text(text) => Some(GroupId(text)),
            RawGroupId::Number(number) => Some(GroupId(number.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawGroupId::deserialize(deserializer)?
            .into_group_id()
            .ok_or_else(|| de::Error::custom("group id must not be empty"))
    }
}

/// Null and blank group ids both mean "no plan".
fn optional_group_id<'de, D>(deserializer: D) -> Result<Option<GroupId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawGroupId>::deserialize(deserializer)?.and_then(RawGroupId::into_group_id))
}

/// One scheduled payable amount, member of exactly one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    #[serde(rename = "codcap")]
    pub id: InstallmentId,
    #[serde(rename = "codfor")]
    pub supplier_id: SupplierId,
    #[serde(rename = "nomfor", skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(rename = "codgrp")]
    pub group_id: GroupId,
    #[serde(rename = "numpar")]
    pub sequence: u32,
    #[serde(rename = "totpar")]
    pub total_count: u32,
    #[serde(rename = "vlrcap")]
    pub amount: Decimal,
    #[serde(rename = "datven")]
    pub due_date: NaiveDate,
    #[serde(rename = "datpag")]
    pub payment_date: Option<NaiveDate>,
    #[serde(rename = "statcap")]
    pub status: InstallmentStatus,
    #[serde(rename = "forpag")]
    pub payment_method: Option<String>,
    #[serde(rename = "catcap")]
    pub category: Option<String>,
    #[serde(rename = "numdoc")]
    pub document: Option<String>,
    #[serde(rename = "obscap")]
    pub notes: Option<String>,
    #[serde(rename = "codemp")]
    pub company_id: i64,
    #[serde(rename = "codfil")]
    pub branch_id: i64,
}

/// Collaborator row as decoded, before the plan id is settled.
#[derive(Deserialize)]
struct InstallmentRow {
    codcap: InstallmentId,
    codfor: SupplierId,
    #[serde(default)]
    nomfor: Option<String>,
    #[serde(default, deserialize_with = "optional_group_id")]
    codgrp: Option<GroupId>,
    #[serde(default = "wire::default_count", deserialize_with = "wire::count_or_one")]
    numpar: u32,
    #[serde(default = "wire::default_count", deserialize_with = "wire::count_or_one")]
    totpar: u32,
    vlrcap: Decimal,
    #[serde(deserialize_with = "wire::date")]
    datven: NaiveDate,
    #[serde(default, deserialize_with = "wire::optional_date")]
    datpag: Option<NaiveDate>,
    statcap: InstallmentStatus,
    #[serde(default)]
    forpag: Option<String>,
    #[serde(default)]
    catcap: Option<String>,
    #[serde(default)]
    numdoc: Option<String>,
    #[serde(default)]
    obscap: Option<String>,
    codemp: i64,
    codfil: i64,
}

impl From<InstallmentRow> for Installment {
    fn from(row: InstallmentRow) -> Self {
        Self {
            id: row.codcap,
            supplier_id: row.codfor,
            supplier_name: row.nomfor,
            group_id: row
                .codgrp
                .unwrap_or_else(|| GroupId::standalone(row.codcap)),
            sequence: row.numpar,
            total_count: row.totpar,
            amount: row.vlrcap,
            due_date: row.datven,
            payment_date: row.datpag,
            status: row.statcap,
            payment_method: row.forpag,
            category: row.catcap,
            document: row.numdoc,
            notes: row.obscap,
            company_id: row.codemp,
            branch_id: row.codfil,
        }
    }
}

impl<'de> Deserialize<'de> for Installment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        InstallmentRow::deserialize(deserializer).map(Installment::from)
    }
}

impl Installment {
    /// Supplier label for plan rows: the name, or `ID: <codfor>` without one.
    pub fn supplier_label(&self) -> String {
        match self.supplier_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("ID: {}", self.supplier_id),
        }
    }
}
