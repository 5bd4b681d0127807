//! Property tests for reconciliation planning.

use std::collections::HashSet;

use proptest::prelude::*;

use featured_sync::models::DeviationId;
use featured_sync::reconcile::{reconcile, Operation};

/// Id sequences drawn from a tiny alphabet so overlaps (and duplicates)
/// between `desired` and `current` are common.
fn id_sequence() -> impl Strategy<Value = Vec<DeviationId>> {
    proptest::collection::vec("[a-d][0-9]", 0..16)
        .prop_map(|ids| ids.into_iter().map(DeviationId::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: reconciling a sequence against itself plans nothing.
    #[test]
    fn property_reconcile_is_idempotent(desired in id_sequence()) {
        let plan = reconcile(&desired, &desired);
        prop_assert!(plan.to_add.is_empty());
        prop_assert!(plan.to_remove.is_empty());
        prop_assert!(plan.is_converged());
    }

    /// PROPERTY: applying the plan to `current` yields `desired`'s set.
    #[test]
    fn property_reconcile_converges(
        desired in id_sequence(),
        current in id_sequence()
    ) {
        let plan = reconcile(&desired, &current);

        let mut members: HashSet<DeviationId> = current.iter().cloned().collect();
        for op in plan.operations() {
            match op {
                Operation::Add(id) => {
                    members.insert(id);
                }
                Operation::Remove(id) => {
                    members.remove(&id);
                }
            }
        }

        let want: HashSet<DeviationId> = desired.iter().cloned().collect();
        prop_assert_eq!(members, want);
    }

    /// PROPERTY: additions come from `desired`, removals from `current`,
    /// and the two never overlap.
    #[test]
    fn property_reconcile_plans_minimal_sets(
        desired in id_sequence(),
        current in id_sequence()
    ) {
        let plan = reconcile(&desired, &current);

        let desired_set: HashSet<&DeviationId> = desired.iter().collect();
        let current_set: HashSet<&DeviationId> = current.iter().collect();

        for id in &plan.to_add {
            prop_assert!(desired_set.contains(id));
            prop_assert!(!current_set.contains(id));
        }
        for id in &plan.to_remove {
            prop_assert!(current_set.contains(id));
            prop_assert!(!desired_set.contains(id));
        }
    }

    /// PROPERTY: `final_order` is always `desired`, verbatim.
    #[test]
    fn property_reconcile_preserves_final_order(
        desired in id_sequence(),
        current in id_sequence()
    ) {
        let plan = reconcile(&desired, &current);
        prop_assert_eq!(plan.final_order, desired);
    }
}
