//! Property tests for the top-N selector.

use chrono::DateTime;
use proptest::prelude::*;

use featured_sync::models::{Deviation, DeviationId};
use featured_sync::select::select_top;

/// Snapshots with distinct ids by construction; favourite counts and
/// publication times collide freely to exercise the tie-breaks.
fn snapshot() -> impl Strategy<Value = Vec<Deviation>> {
    proptest::collection::vec((0u64..50, 0i64..2_000_000_000), 0..40).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (favourites, secs))| {
                Deviation::new(
                    format!("dev-{i:03}"),
                    favourites,
                    DateTime::from_timestamp(secs, 0).unwrap(),
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: output length is always `min(n, items.len())`.
    #[test]
    fn property_selection_length_is_min_of_n_and_len(
        items in snapshot(),
        n in 1usize..30
    ) {
        let selected = select_top(&items, n).unwrap();
        prop_assert_eq!(selected.len(), n.min(items.len()));
    }

    /// PROPERTY: shuffling the input never changes the output.
    #[test]
    fn property_selection_is_permutation_invariant(
        (items, shuffled) in snapshot()
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        n in 1usize..30
    ) {
        let from_original = select_top(&items, n).unwrap();
        let from_shuffled = select_top(&shuffled, n).unwrap();
        prop_assert_eq!(from_original, from_shuffled);
    }

    /// PROPERTY: output is sorted by favourite count descending.
    #[test]
    fn property_selection_is_sorted_by_favourites(
        items in snapshot(),
        n in 1usize..30
    ) {
        let selected = select_top(&items, n).unwrap();
        for pair in selected.windows(2) {
            prop_assert!(pair[0].favourites >= pair[1].favourites);
        }
    }

    /// PROPERTY: selected ids are a subset of the input's ids.
    #[test]
    fn property_selection_draws_from_input(
        items in snapshot(),
        n in 1usize..30
    ) {
        let input_ids: Vec<&DeviationId> = items.iter().map(|d| &d.id).collect();
        let selected = select_top(&items, n).unwrap();
        for dev in &selected {
            prop_assert!(input_ids.contains(&&dev.id));
        }
    }
}
