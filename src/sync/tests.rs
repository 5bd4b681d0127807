use chrono::{TimeZone, Utc};

use super::*;
use crate::error::SyncError;
use crate::models::{Deviation, DeviationId};
use crate::reconcile::reconcile;

const DEST: &str = "Top 20 Favorites";

fn dev(id: &str, favourites: u64, year: i32) -> Deviation {
    Deviation::new(
        id,
        favourites,
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn engine(top_n: usize) -> SyncEngine {
    SyncEngine::new(SyncSettings {
        source: SourceSelection::AllFolders,
        dest_gallery: DEST.to_string(),
        top_n,
    })
}

#[test]
fn run_converges_destination_to_selection() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 5, 2020), dev("b", 9, 2020), dev("c", 2, 2020)];
    gallery.members = vec!["c".into(), "stale".into()];

    let report = engine(2).run(&mut gallery).unwrap();

    assert_eq!(report.scanned, 3);
    let selected: Vec<&str> = report.selection.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(selected, ["b", "a"]);

    // Destination now holds exactly the selection's set.
    let mut members: Vec<&str> = gallery.members.iter().map(|m| m.as_str()).collect();
    members.sort_unstable();
    assert_eq!(members, ["a", "b"]);
    assert_eq!(report.stats.added, 2);
    assert_eq!(report.stats.removed, 2);
    assert_eq!(report.stats.noops, 0);
}

#[test]
fn converged_run_issues_no_mutations() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 5, 2020), dev("b", 9, 2020)];
    gallery.members = vec!["b".into(), "a".into()];

    let report = engine(2).run(&mut gallery).unwrap();

    assert!(report.is_converged());
    assert!(gallery.applied.is_empty());
    assert_eq!(report.stats, ApplyStats::default());
}

#[test]
fn second_run_after_convergence_is_a_noop() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 5, 2020), dev("b", 9, 2020), dev("c", 1, 2020)];

    let first = engine(2).run(&mut gallery).unwrap();
    assert!(!first.is_converged());

    gallery.applied.clear();
    let second = engine(2).run(&mut gallery).unwrap();

    assert!(second.is_converged());
    assert!(gallery.applied.is_empty());
}

#[test]
fn plan_stage_never_writes() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 5, 2020)];
    gallery.members = vec!["old".into()];

    let report = engine(1).plan(&mut gallery).unwrap();

    assert!(!report.plan.is_converged());
    assert!(gallery.applied.is_empty());
    assert_eq!(gallery.members, vec![DeviationId::from("old")]);
    assert_eq!(report.stats, ApplyStats::default());
}

#[test]
fn empty_source_still_clears_stale_members() {
    let mut gallery = MockGallery::new(DEST);
    gallery.members = vec!["stale1".into(), "stale2".into()];

    let report = engine(20).run(&mut gallery).unwrap();

    assert!(report.selection.is_empty());
    assert!(gallery.members.is_empty());
    assert_eq!(report.stats.removed, 2);
}

#[test]
fn removals_are_applied_before_additions() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("new", 9, 2020)];
    gallery.members = vec!["old".into()];

    engine(1).run(&mut gallery).unwrap();

    assert_eq!(gallery.applied, vec!["remove old", "add new"]);
}

#[test]
fn already_satisfied_operations_count_as_noops() {
    let gallery_plan = reconcile(
        &["a".into(), "b".into()],
        &[DeviationId::from("x")],
    );

    // Destination drifted between plan and apply: "a" already present,
    // "x" already gone.
    let mut gallery = MockGallery::new(DEST);
    gallery.members = vec!["a".into()];

    let stats = engine(2).apply(&mut gallery, &gallery_plan).unwrap();

    assert_eq!(stats.noops, 2);
    assert_eq!(stats.added, 1);
    assert_eq!(stats.removed, 0);
    let mut members: Vec<&str> = gallery.members.iter().map(|m| m.as_str()).collect();
    members.sort_unstable();
    assert_eq!(members, ["a", "b"]);
}

#[test]
fn unknown_destination_fails_with_folder_not_found() {
    let mut gallery = MockGallery::new("Somewhere Else");
    gallery.source = vec![dev("a", 1, 2020)];

    let err = engine(1).run(&mut gallery).unwrap_err();

    assert!(matches!(err, SyncError::FolderNotFound { .. }));
}

#[test]
fn zero_top_n_propagates_invalid_argument() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 1, 2020)];

    let err = engine(0).run(&mut gallery).unwrap_err();

    assert!(matches!(err, SyncError::TopNOutOfRange { n: 0 }));
}

#[test]
fn duplicate_source_ids_propagate_integrity_fault() {
    let mut gallery = MockGallery::new(DEST);
    gallery.source = vec![dev("a", 1, 2020), dev("a", 2, 2021)];

    let err = engine(1).run(&mut gallery).unwrap_err();

    assert!(matches!(err, SyncError::DuplicateDeviation { .. }));
}
