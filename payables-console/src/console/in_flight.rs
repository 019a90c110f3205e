use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::models::InstallmentId;

/// What a mutating request is in flight for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InFlightKey {
    Installment(InstallmentId),
    PlanCreation,
}

impl fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InFlightKey::Installment(id) => write!(f, "installment {}", id),
            InFlightKey::PlanCreation => f.write_str("plan creation"),
        }
    }
}

/// At most one mutating request per key.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<DashMap<InFlightKey, ()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the key is already held.
    pub fn try_acquire(&self, key: InFlightKey) -> Option<InFlightGuard> {
        match self.active.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightGuard {
                    active: Arc::clone(&self.active),
                    key,
                })
            }
        }
    }

    pub fn is_held(&self, key: InFlightKey) -> bool {
        self.active.contains_key(&key)
    }
}

/// Releases its key on drop, including when the owning future is dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<DashMap<InFlightKey, ()>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
