//! Destination reconciliation
//!
//! Stage 1: `reconcile()` - compute the minimal add/remove plan, no calls
//! Stage 2: the caller applies the plan through a `GalleryWriter`
//!
//! Both stages treat gallery membership as a set; `final_order` carries the
//! authoritative target ordering for destinations that preserve it.

use std::collections::{BTreeSet, HashSet};

use crate::models::DeviationId;

/// A single destination mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Add the deviation to the destination gallery
    Add(DeviationId),
    /// Remove the deviation from the destination gallery
    Remove(DeviationId),
}

impl Operation {
    pub fn id(&self) -> &DeviationId {
        match self {
            Operation::Add(id) | Operation::Remove(id) => id,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Add(id) => write!(f, "add {id}"),
            Operation::Remove(id) => write!(f, "remove {id}"),
        }
    }
}

/// Outcome of applying one operation at the destination.
///
/// `NoOp` covers operations that were already satisfied (adding a present
/// id, removing an absent one); callers must not treat it as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    NoOp,
}

/// Result of planning a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPlan {
    /// Ids to add, in desired order
    pub to_add: Vec<DeviationId>,
    /// Ids to remove; order is irrelevant, kept sorted for determinism
    pub to_remove: BTreeSet<DeviationId>,
    /// The authoritative target state, verbatim
    pub final_order: Vec<DeviationId>,
}

impl OperationPlan {
    /// True when the destination already matches the desired set.
    pub fn is_converged(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of mutations the plan will issue.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_converged()
    }

    /// Operations in application order: removals first, then additions in
    /// desired order. Removing first keeps the destination within its size
    /// cap throughout the run.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.to_remove
            .iter()
            .cloned()
            .map(Operation::Remove)
            .chain(self.to_add.iter().cloned().map(Operation::Add))
    }
}

/// Compute the minimal set of operations converging `current` to `desired`.
///
/// Pure function. Duplicate ids within either input collapse to set
/// semantics. `reconcile(d, d)` is empty both ways, so a converged
/// destination makes the next run a no-op.
pub fn reconcile(desired: &[DeviationId], current: &[DeviationId]) -> OperationPlan {
    let desired_set: HashSet<&DeviationId> = desired.iter().collect();
    let current_set: HashSet<&DeviationId> = current.iter().collect();

    let to_remove: BTreeSet<DeviationId> = current
        .iter()
        .filter(|id| !desired_set.contains(id))
        .cloned()
        .collect();

    let mut queued: HashSet<&DeviationId> = HashSet::new();
    let to_add: Vec<DeviationId> = desired
        .iter()
        .filter(|id| !current_set.contains(id) && queued.insert(id))
        .cloned()
        .collect();

    OperationPlan {
        to_add,
        to_remove,
        final_order: desired.to_vec(),
    }
}
