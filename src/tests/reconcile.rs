use crate::bookmarks::{Bookmark, BookmarkCreate, Status};
use crate::reconcile::{self, Mode, Outcome, ReconcileOptions, Summary, Tier};
use crate::snapshot;

fn source(len: usize) -> Vec<String> {
    (1..=len).map(|n| format!("line {n}")).collect()
}

/// A bookmark captured at `line` of `lines`, as `add` would create it.
fn bookmark_at(file: &str, lines: &[String], line: usize) -> Bookmark {
    Bookmark::create(
        BookmarkCreate {
            file: file.to_string(),
            line,
            snapshot: snapshot::capture(lines, line, 1).unwrap(),
            ..Default::default()
        },
        crate::bookmarks::now(),
    )
}

fn insert_above(lines: &[String], at: usize, count: usize) -> Vec<String> {
    let mut out = lines.to_vec();
    for n in 0..count {
        out.insert(at, format!("inserted {n}"));
    }
    out
}

fn opts() -> ReconcileOptions {
    ReconcileOptions::default()
}

#[test]
pub fn test_unchanged_file_is_valid_repeatably() {
    let lines = source(30);
    let bm = bookmark_at("a.rs", &lines, 12);

    for _ in 0..3 {
        assert_eq!(reconcile::reconcile(&bm, Some(lines.as_slice()), &opts()), Outcome::Valid);
    }
}

#[test]
pub fn test_nearby_shift_recovery() {
    let lines = source(40);
    let mut bm = bookmark_at("a.rs", &lines, 20);

    for k in 1..=10 {
        let shifted = insert_above(&lines, 3, k);
        match reconcile::reconcile(&bm, Some(shifted.as_slice()), &opts()) {
            Outcome::Moved { line, tier, snapshot } => {
                assert_eq!(line, 20 + k);
                assert_eq!(tier, Tier::Nearby);
                assert_eq!(snapshot.target, "line 20");
                assert_eq!(snapshot.before, vec!["line 19"]);
            }
            other => panic!("k={k}: expected moved, got {other:?}"),
        }
    }

    let shifted = insert_above(&lines, 0, 4);
    let outcome = reconcile::reconcile(&bm, Some(shifted.as_slice()), &opts());
    assert!(reconcile::apply(&mut bm, &outcome, Mode::Fix, crate::bookmarks::now()));
    assert_eq!(bm.line, 24);
    assert_eq!(bm.status, Status::Valid);
    assert_eq!(reconcile::reconcile(&bm, Some(shifted.as_slice()), &opts()), Outcome::Valid);
}

#[test]
pub fn test_beyond_window_uses_file_wide_scan() {
    let lines = source(40);
    let bm = bookmark_at("a.rs", &lines, 20);
    let shifted = insert_above(&lines, 0, 15);

    match reconcile::reconcile(&bm, Some(shifted.as_slice()), &opts()) {
        Outcome::Moved { line, tier, .. } => {
            assert_eq!(line, 35);
            assert_eq!(tier, Tier::FileWide);
        }
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
pub fn test_nearby_prefers_closest_then_earlier() {
    let mut lines = source(30);
    lines[9] = "target".to_string(); // line 10
    let bm = bookmark_at("a.rs", &lines, 10);

    // copies at distance 3 above and below, plus one at distance 2 below
    let mut edited = source(30);
    edited[6] = "target".to_string(); // line 7
    edited[12] = "target".to_string(); // line 13
    match reconcile::reconcile(&bm, Some(edited.as_slice()), &opts()) {
        Outcome::Moved { line, .. } => assert_eq!(line, 7),
        other => panic!("expected moved, got {other:?}"),
    }

    edited[11] = "target".to_string(); // line 12
    match reconcile::reconcile(&bm, Some(edited.as_slice()), &opts()) {
        Outcome::Moved { line, .. } => assert_eq!(line, 12),
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
pub fn test_nearby_wins_over_earlier_file_match() {
    let mut lines = source(60);
    lines[39] = "target".to_string();
    let bm = bookmark_at("a.rs", &lines, 40);

    let mut edited = source(60);
    edited[1] = "target".to_string(); // line 2, far away
    edited[44] = "target".to_string(); // line 45, within radius
    match reconcile::reconcile(&bm, Some(edited.as_slice()), &opts()) {
        Outcome::Moved { line, tier, .. } => {
            assert_eq!(line, 45);
            assert_eq!(tier, Tier::Nearby);
        }
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
pub fn test_file_wide_takes_first_match() {
    let mut lines = source(80);
    lines[69] = "target".to_string();
    let bm = bookmark_at("a.rs", &lines, 70);

    let mut edited = source(80);
    edited[4] = "target".to_string();
    edited[19] = "target".to_string();
    match reconcile::reconcile(&bm, Some(edited.as_slice()), &opts()) {
        Outcome::Moved { line, .. } => assert_eq!(line, 5),
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
pub fn test_custom_radius() {
    let lines = source(40);
    let bm = bookmark_at("a.rs", &lines, 20);
    let shifted = insert_above(&lines, 0, 3);

    let narrow = ReconcileOptions {
        search_radius: 2,
        ..opts()
    };
    match reconcile::reconcile(&bm, Some(shifted.as_slice()), &narrow) {
        Outcome::Moved { line, tier, .. } => {
            assert_eq!(line, 23);
            assert_eq!(tier, Tier::FileWide);
        }
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
pub fn test_comparison_is_strict() {
    let lines = vec!["fn main() {".to_string(), "    run();".to_string(), "}".to_string()];
    let bm = bookmark_at("a.rs", &lines, 2);

    let reindented = vec!["fn main() {".to_string(), "  run();".to_string(), "}".to_string()];
    assert_eq!(
        reconcile::reconcile(&bm, Some(reindented.as_slice()), &opts()),
        Outcome::Stale { empty_file: false }
    );
}

#[test]
pub fn test_deleted_line_is_stale_and_untouched() {
    let lines = source(20);
    let mut bm = bookmark_at("a.rs", &lines, 8);
    let snapshot_before = bm.snapshot.clone();

    let mut edited = lines.clone();
    edited.remove(7);

    let outcome = reconcile::reconcile(&bm, Some(edited.as_slice()), &opts());
    assert_eq!(outcome, Outcome::Stale { empty_file: false });

    let changed = reconcile::apply(&mut bm, &outcome, Mode::Report, crate::bookmarks::now());
    assert!(!changed);
    assert_eq!(bm.status, Status::Stale);
    assert_eq!(bm.line, 8);
    assert_eq!(bm.snapshot, snapshot_before);

    // fix mode never commits a stale outcome either
    reconcile::apply(&mut bm, &outcome, Mode::Fix, crate::bookmarks::now());
    assert_eq!(bm.status, Status::Stale);
    assert_eq!(bm.line, 8);
}

#[test]
pub fn test_empty_file_is_stale() {
    let lines = source(5);
    let bm = bookmark_at("a.rs", &lines, 2);
    assert_eq!(
        reconcile::reconcile(&bm, Some(Vec::<String>::new().as_slice()), &opts()),
        Outcome::Stale { empty_file: true }
    );
}

#[test]
pub fn test_missing_file_dominates() {
    let lines = source(5);
    let mut bm = bookmark_at("a.rs", &lines, 2);
    assert_eq!(bm.status, Status::Valid);

    let outcome = reconcile::reconcile(&bm, None, &opts());
    assert_eq!(outcome, Outcome::MissingFile { cause: None });

    reconcile::apply(&mut bm, &outcome, Mode::Fix, crate::bookmarks::now());
    assert_eq!(bm.status, Status::MissingFile);
    assert_eq!(bm.line, 2);
}

#[test]
pub fn test_report_mode_keeps_line_for_moved() {
    let lines = source(30);
    let mut bm = bookmark_at("a.rs", &lines, 10);
    bm.checked = None;
    let shifted = insert_above(&lines, 0, 2);

    let outcome = reconcile::reconcile(&bm, Some(shifted.as_slice()), &opts());
    let changed = reconcile::apply(&mut bm, &outcome, Mode::Report, crate::bookmarks::now());

    assert!(!changed);
    assert_eq!(bm.status, Status::Moved);
    assert_eq!(bm.line, 10);
    assert!(bm.checked.is_some());
}

#[test]
pub fn test_reconcile_all_reads_files_and_survives_bad_items() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let lines = source(30);
    std::fs::write(root.join("a.rs"), lines.join("\n")).unwrap();
    std::fs::write(root.join("bin.dat"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
    std::fs::create_dir(root.join("dir.rs")).unwrap();

    let valid = bookmark_at("a.rs", &lines, 5);
    let mut moved = bookmark_at("a.rs", &lines, 9);
    moved.line = 7;
    let gone = bookmark_at("gone.rs", &lines, 3);
    let binary = bookmark_at("bin.dat", &lines, 1);
    let directory = bookmark_at("dir.rs", &lines, 1);

    let bmarks = vec![valid, moved, gone, binary, directory];
    let results = reconcile::reconcile_all(root, &bmarks, &opts());

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].outcome, Outcome::Valid);
    assert!(matches!(results[1].outcome, Outcome::Moved { line: 9, .. }));
    assert_eq!(results[2].outcome, Outcome::MissingFile { cause: None });
    assert!(matches!(results[3].outcome, Outcome::MissingFile { cause: Some(_) }));
    assert!(matches!(results[4].outcome, Outcome::MissingFile { cause: Some(_) }));

    for (bm, result) in bmarks.iter().zip(&results) {
        assert_eq!(bm.id, result.id);
        assert_eq!(bm.line, result.line);
    }

    let summary = Summary::from_results(&results);
    assert_eq!(summary.count(Status::Valid), 1);
    assert_eq!(summary.count(Status::Moved), 1);
    assert_eq!(summary.count(Status::Stale), 0);
    assert_eq!(summary.count(Status::MissingFile), 3);
    assert_eq!(summary.total(), 5);
}

#[test]
pub fn test_reconcile_all_handles_crlf_files() {
    let tmp = tempfile::tempdir().unwrap();
    let lines = source(10);
    std::fs::write(tmp.path().join("win.rs"), lines.join("\r\n")).unwrap();

    let bm = bookmark_at("win.rs", &lines, 4);
    let results = reconcile::reconcile_all(tmp.path(), &[bm], &opts());
    assert_eq!(results[0].outcome, Outcome::Valid);
}

#[test]
pub fn test_messages() {
    let tmp = tempfile::tempdir().unwrap();
    let lines = source(10);
    let bm = bookmark_at("gone.rs", &lines, 4);

    let results = reconcile::reconcile_all(tmp.path(), &[bm], &opts());
    assert_eq!(results[0].message(), "file not found: gone.rs");
}
