//! Top-N selection
//!
//! Pure ranking step: given one snapshot of candidate deviations, compute
//! the ordered top-N subset. The ordering is a total order so the result
//! never depends on the (unstable) listing order of paginated reads.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{SyncError, SyncResult};
use crate::models::Deviation;

/// Total ranking order: favourite count descending, publication time
/// descending (most recent wins a tie), deviation id ascending.
pub fn ranking_order(a: &Deviation, b: &Deviation) -> Ordering {
    b.favourites
        .cmp(&a.favourites)
        .then_with(|| b.published.cmp(&a.published))
        .then_with(|| a.id.cmp(&b.id))
}

/// Select the top `n` deviations from one source snapshot.
///
/// Returns the ranked prefix of length `min(n, items.len())`. Fails with
/// `TopNOutOfRange` for `n == 0` and with `DuplicateDeviation` when the
/// snapshot contains the same id twice (a data-integrity fault upstream -
/// cross-folder duplicates must be collapsed before ranking).
pub fn select_top(items: &[Deviation], n: usize) -> SyncResult<Vec<Deviation>> {
    if n == 0 {
        return Err(SyncError::TopNOutOfRange { n });
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(&item.id) {
            return Err(SyncError::DuplicateDeviation {
                id: item.id.to_string(),
            });
        }
    }

    let mut ranked = items.to_vec();
    ranked.sort_by(ranking_order);
    ranked.truncate(n);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviationId;
    use chrono::{DateTime, TimeZone, Utc};

    fn dev(id: &str, favourites: u64, published: DateTime<Utc>) -> Deviation {
        Deviation::new(id, favourites, published)
    }

    fn year(y: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn select_returns_min_of_n_and_len() {
        let items = vec![
            dev("a", 3, year(2020)),
            dev("b", 1, year(2020)),
            dev("c", 2, year(2020)),
        ];

        assert_eq!(select_top(&items, 2).unwrap().len(), 2);
        assert_eq!(select_top(&items, 3).unwrap().len(), 3);
        assert_eq!(select_top(&items, 10).unwrap().len(), 3);
    }

    #[test]
    fn select_empty_input_is_empty() {
        let selected = select_top(&[], 5).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn select_zero_n_is_rejected() {
        let items = vec![dev("a", 1, year(2020))];
        let err = select_top(&items, 0).unwrap_err();

        assert!(matches!(err, SyncError::TopNOutOfRange { n: 0 }));
    }

    #[test]
    fn select_duplicate_id_is_rejected() {
        let items = vec![dev("a", 1, year(2020)), dev("a", 2, year(2021))];
        let err = select_top(&items, 1).unwrap_err();

        match err {
            SyncError::DuplicateDeviation { id } => assert_eq!(id, "a"),
            other => panic!("expected DuplicateDeviation, got {other:?}"),
        }
    }

    #[test]
    fn select_orders_by_favourites_descending() {
        let items = vec![
            dev("a", 5, year(2020)),
            dev("b", 9, year(2020)),
            dev("c", 7, year(2020)),
        ];
        let selected = select_top(&items, 3).unwrap();
        let ids: Vec<&str> = selected.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn select_breaks_favourite_ties_by_most_recent() {
        // Worked example from the design notes: favourite tie between b, c
        // and d resolves to the most recently published first.
        let items = vec![
            dev("a", 5, year(2020)),
            dev("b", 9, year(2019)),
            dev("c", 9, year(2020)),
            dev("d", 9, year(2021)),
        ];
        let selected = select_top(&items, 2).unwrap();
        let ids: Vec<&str> = selected.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, ["d", "c"]);
    }

    #[test]
    fn select_breaks_full_ties_by_id_ascending() {
        let items = vec![
            dev("z", 4, year(2020)),
            dev("m", 4, year(2020)),
            dev("a", 4, year(2020)),
        ];
        let selected = select_top(&items, 3).unwrap();
        let ids: Vec<&str> = selected.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, ["a", "m", "z"]);
    }

    #[test]
    fn select_is_invariant_under_input_permutation() {
        let forward = vec![
            dev("a", 2, year(2018)),
            dev("b", 8, year(2021)),
            dev("c", 8, year(2019)),
            dev("d", 1, year(2022)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(2);

        let expected: Vec<DeviationId> = select_top(&forward, 3)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();

        for permutation in [reversed, rotated] {
            let got: Vec<DeviationId> = select_top(&permutation, 3)
                .unwrap()
                .into_iter()
                .map(|d| d.id)
                .collect();
            assert_eq!(got, expected);
        }
    }
}
