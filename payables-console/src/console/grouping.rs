//! Plan grouping: partition a flat installment list into payment plans.
//!
//! Pure and deterministic. The console regroups from the current summary
//! every time a view is built, so aggregates always reflect the latest
//! confirmed state.

use crate::models::{GroupId, Installment, InstallmentStatus};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// One plan's members (ordered by sequence) and its aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub group_id: GroupId,
    pub members: Vec<Installment>,
    pub total_amount: Decimal,
    pub paid_count: usize,
    pub total_count: usize,
}

impl Plan {
    fn from_members(group_id: GroupId, mut members: Vec<Installment>) -> Self {
        members.sort_by_key(|m| (m.sequence, m.id));

        let total_amount = members.iter().map(|m| m.amount).sum();
        let paid_count = members
            .iter()
            .filter(|m| m.status == InstallmentStatus::Paid)
            .count();
        let total_count = members.len();

        Self {
            group_id,
            members,
            total_amount,
            paid_count,
            total_count,
        }
    }

    /// Member with sequence 1, or the lowest sequence present when a status
    /// filter hid the first installment.
    pub fn representative(&self) -> Option<&Installment> {
        self.members.first()
    }

    /// Paid / total, in `[0, 1]`. Zero when the plan has no members.
    pub fn progress(&self) -> f64 {
        progress_ratio(self.paid_count, self.total_count)
    }
}

pub fn progress_ratio(paid_count: usize, total_count: usize) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    (paid_count.min(total_count) as f64) / (total_count as f64)
}

/// Plans keyed by group id, iterated in ascending group id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanIndex {
    plans: BTreeMap<GroupId, Plan>,
}

impl PlanIndex {
    pub fn get(&self, group_id: &GroupId) -> Option<&Plan> {
        self.plans.get(group_id)
    }

    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.values()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Concatenate every plan's members, plans in index order.
    pub fn flatten(&self) -> Vec<Installment> {
        self.plans
            .values()
            .flat_map(|plan| plan.members.iter().cloned())
            .collect()
    }
}

pub fn group_installments(installments: &[Installment]) -> PlanIndex {
    let mut buckets: BTreeMap<GroupId, Vec<Installment>> = BTreeMap::new();
    for installment in installments {
        buckets
            .entry(installment.group_id.clone())
            .or_default()
            .push(installment.clone());
    }

    let plans = buckets
        .into_iter()
        .map(|(group_id, members)| {
            let plan = Plan::from_members(group_id.clone(), members);
            (group_id, plan)
        })
        .collect();

    PlanIndex { plans }
}
