//! Per-group detail buffers for expanded plans.
//!
//! Each expanded group owns its buffer. A load is identified by a ticket;
//! a result whose ticket is no longer current (the group was collapsed or
//! reloaded meanwhile) is discarded.

use crate::models::{GroupId, Installment, InstallmentId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailBuffer {
    Loading,
    Ready(Vec<Installment>),
    Failed(String),
}

#[derive(Debug, Clone)]
struct Expanded {
    ticket: u64,
    buffer: DetailBuffer,
}

#[derive(Debug, Clone, Default)]
pub struct GroupDetails {
    expanded: BTreeMap<GroupId, Expanded>,
    next_ticket: u64,
}

impl GroupDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, group_id: &GroupId) -> bool {
        self.expanded.contains_key(group_id)
    }

    pub fn expanded_groups(&self) -> impl Iterator<Item = &GroupId> {
        self.expanded.keys()
    }

    pub fn buffer(&self, group_id: &GroupId) -> Option<&DetailBuffer> {
        self.expanded.get(group_id).map(|e| &e.buffer)
    }

    /// Mark the group expanded with a `Loading` buffer and hand out the
    /// ticket the eventual result must present.
    pub fn begin_load(&mut self, group_id: &GroupId) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.expanded.insert(
            group_id.clone(),
            Expanded {
                ticket,
                buffer: DetailBuffer::Loading,
            },
        );
        ticket
    }

    /// Store a load result. Returns `false` when the result was stale.
    pub fn finish_load(
        &mut self,
        group_id: &GroupId,
        ticket: u64,
        result: Result<Vec<Installment>, String>,
    ) -> bool {
        let Some(entry) = self.expanded.get_mut(group_id) else {
            return false;
        };
        if entry.ticket != ticket {
            return false;
        }

        entry.buffer = match result {
            Ok(mut members) => {
                members.sort_by_key(|m| (m.sequence, m.id));
                DetailBuffer::Ready(members)
            }
            Err(message) => DetailBuffer::Failed(message),
        };
        true
    }

    /// Drop the expanded mark and the buffer. Returns whether it was expanded.
    pub fn collapse(&mut self, group_id: &GroupId) -> bool {
        self.expanded.remove(group_id).is_some()
    }

    /// An installment as last seen in any ready buffer.
    pub fn find(&self, id: InstallmentId) -> Option<&Installment> {
        self.expanded.values().find_map(|e| match &e.buffer {
            DetailBuffer::Ready(members) => members.iter().find(|m| m.id == id),
            _ => None,
        })
    }
}
