//! Optimistic mutations
//!
//! A mutation updates the displayed value before the server answers and keeps
//! a snapshot of the previous value. The snapshot is restored verbatim if the
//! call fails and discarded once it succeeds. While a mutation is pending the
//! cell rejects new ones, which is what guards a control against double
//! submission.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::ApiError;
use tracing::{debug, warn};

/// How a mutation settled
#[derive(Debug)]
pub enum MutationOutcome {
    /// The server confirmed the optimistic value
    Applied,
    /// The server disagreed about the starting state and a compensating call
    /// brought it to the state the user asked for
    Repaired,
    /// The target was already gone; local state was aligned with the server
    Reconciled,
    /// The call failed; the snapshot was restored
    RolledBack(ApiError),
    /// A compensating call failed after the server disagreed about the
    /// starting state; the snapshot was restored
    RepairFailed(ApiError),
    /// Another mutation was still pending; nothing was sent
    Ignored,
}

impl MutationOutcome {
    /// Whether the server ended up in the state the user asked for
    pub fn is_success(&self) -> bool {
        matches!(self, MutationOutcome::Applied | MutationOutcome::Repaired)
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    pending: bool,
}

/// Displayed value with at most one optimistic mutation in flight
#[derive(Debug)]
pub struct OptimisticCell<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for OptimisticCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone> OptimisticCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value,
                pending: false,
            })),
        }
    }

    /// Current displayed value
    pub fn get(&self) -> T {
        lock(&self.slot).value.clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending
    }

    /// Replace the value with server truth; refused while a mutation is pending
    pub fn set(&self, value: T) -> bool {
        let mut slot = lock(&self.slot);
        if slot.pending {
            return false;
        }
        slot.value = value;
        true
    }

    /// Start a mutation by applying `apply` to the displayed value
    ///
    /// Returns `None` without calling `apply` while another mutation is
    /// pending.
    pub fn begin(&self, apply: impl FnOnce(&mut T)) -> Option<Pending<T>> {
        let mut slot = lock(&self.slot);
        if slot.pending {
            debug!("Mutation already pending, ignoring");
            return None;
        }

        let snapshot = slot.value.clone();
        apply(&mut slot.value);
        slot.pending = true;

        Some(Pending {
            slot: Arc::clone(&self.slot),
            snapshot,
            settled: false,
        })
    }
}

/// A pending optimistic mutation
///
/// Dropping it without calling [`commit`](Pending::commit) or
/// [`rollback`](Pending::rollback) rolls back.
#[derive(Debug)]
pub struct Pending<T: Clone> {
    slot: Arc<Mutex<Slot<T>>>,
    snapshot: T,
    settled: bool,
}

impl<T: Clone> Pending<T> {
    /// Value captured before the mutation
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Current displayed value
    pub fn current(&self) -> T {
        lock(&self.slot).value.clone()
    }

    /// Adjust the displayed value while the mutation is still pending
    pub fn update(&self, apply: impl FnOnce(&mut T)) {
        apply(&mut lock(&self.slot).value);
    }

    /// Keep the displayed value and discard the snapshot
    pub fn commit(mut self) {
        self.settle(false);
    }

    /// Restore the snapshot verbatim
    pub fn rollback(mut self) {
        self.settle(true);
    }

    fn settle(&mut self, restore: bool) {
        if self.settled {
            return;
        }
        self.settled = true;
        let mut slot = lock(&self.slot);
        if restore {
            slot.value = self.snapshot.clone();
        }
        slot.pending = false;
    }
}

impl<T: Clone> Drop for Pending<T> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Pending mutation dropped without settling, rolling back");
            self.settle(true);
        }
    }
}
