//! Re-locating bookmarks after their files have been edited.
//!
//! Tiers, first match wins:
//! 1. the file is gone or unreadable: `missing_file`
//! 2. the recorded line still holds the target text: `valid`
//! 3. the target sits within `radius` lines of the recorded one: `moved`
//! 4. the target appears anywhere in the file: `moved`
//! 5. otherwise: `stale`
//!
//! [`reconcile`] is pure. [`reconcile_all`] adds the per-bookmark file read
//! and never fails as a whole; [`apply`] is where a caller commits an outcome.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};

use crate::{
    bookmarks::{Bookmark, ContextSnapshot, Status},
    eid::Eid,
    snapshot::{self, lines_equal},
};

pub const DEFAULT_SEARCH_RADIUS: usize = 10;
pub const DEFAULT_CONTEXT_LINES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Lines searched on each side of the recorded line.
    pub search_radius: usize,
    /// Capture width used when proposing a new snapshot.
    pub context_lines: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Record the status only, keep line and snapshot.
    Report,
    /// Commit proposed relocations and mark them valid.
    Fix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Nearby,
    FileWide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Moved {
        line: usize,
        snapshot: ContextSnapshot,
        tier: Tier,
    },
    Stale {
        empty_file: bool,
    },
    MissingFile {
        /// Read error text when the file exists but could not be read.
        cause: Option<String>,
    },
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Valid => Status::Valid,
            Outcome::Moved { .. } => Status::Moved,
            Outcome::Stale { .. } => Status::Stale,
            Outcome::MissingFile { .. } => Status::MissingFile,
        }
    }
}

/// One bookmark's verdict, detached from the bookmark itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub id: Eid,
    pub file: String,
    pub line: usize,
    pub previous: Status,
    pub outcome: Outcome,
}

impl Reconciliation {
    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::Valid => "exact match at original line".to_string(),
            Outcome::Moved {
                line,
                tier: Tier::Nearby,
                ..
            } => format!("found nearby (moved from line {} to {line})", self.line),
            Outcome::Moved {
                line,
                tier: Tier::FileWide,
                ..
            } => format!("found at line {line} (moved from {})", self.line),
            Outcome::Stale { empty_file: true } => "file is empty".to_string(),
            Outcome::Stale { empty_file: false } => "target line not found in file".to_string(),
            Outcome::MissingFile { cause: None } => format!("file not found: {}", self.file),
            Outcome::MissingFile { cause: Some(cause) } => {
                format!("file unreadable: {}: {cause}", self.file)
            }
        }
    }
}

/// Decide where `bookmark` now points. `lines` is `None` when the file is
/// missing.
pub fn reconcile(
    bookmark: &Bookmark,
    lines: Option<&[String]>,
    opts: &ReconcileOptions,
) -> Outcome {
    let Some(lines) = lines else {
        return Outcome::MissingFile { cause: None };
    };

    let target = &bookmark.snapshot.target;
    let matches_at = |idx: usize| lines.get(idx).is_some_and(|l| lines_equal(l, target));

    // line is 1-based; 0 would be a corrupt record, treat as before the file
    let recorded = bookmark.line.saturating_sub(1);
    if bookmark.line >= 1 && matches_at(recorded) {
        return Outcome::Valid;
    }

    let found = nearby_offsets(recorded, opts.search_radius)
        .find(|idx| matches_at(*idx))
        .map(|idx| (idx, Tier::Nearby))
        .or_else(|| {
            lines
                .iter()
                .position(|l| lines_equal(l, target))
                .map(|idx| (idx, Tier::FileWide))
        });

    match found {
        Some((idx, tier)) => {
            log::debug!(
                "{} target found at line {} ({tier:?})",
                bookmark.id,
                idx + 1
            );
            // idx came from the buffer, capture cannot be out of range
            let snapshot = snapshot::capture(lines, idx + 1, opts.context_lines)
                .unwrap_or_else(|_| bookmark.snapshot.clone());
            Outcome::Moved {
                line: idx + 1,
                snapshot,
                tier,
            }
        }
        None => Outcome::Stale {
            empty_file: lines.is_empty(),
        },
    }
}

/// Indices at distance 1..=radius from `center`, closest first, the earlier
/// line first on ties. Indices before the start of the buffer are skipped.
fn nearby_offsets(center: usize, radius: usize) -> impl Iterator<Item = usize> {
    (1..=radius).flat_map(move |distance| {
        let above = center.checked_sub(distance);
        let below = center.checked_add(distance);
        above.into_iter().chain(below)
    })
}

/// What reading a bookmark's source file produced.
enum Source {
    Lines(Vec<String>),
    Missing,
    Unreadable(String),
}

/// Reconcile every bookmark against the files under `root`.
///
/// Each file is read once no matter how many bookmarks point into it. A
/// read failure turns into `missing_file` for the affected bookmarks only.
pub fn reconcile_all(
    root: &Path,
    bookmarks: &[Bookmark],
    opts: &ReconcileOptions,
) -> Vec<Reconciliation> {
    let _span = tracing::debug_span!("reconcile_all", count = bookmarks.len()).entered();

    let mut sources: HashMap<&str, Source> = HashMap::new();

    bookmarks
        .iter()
        .map(|bmark| {
            let source = sources
                .entry(bmark.file.as_str())
                .or_insert_with(|| read_source(root, &bmark.file));

            let outcome = match source {
                Source::Lines(lines) => reconcile(bmark, Some(lines.as_slice()), opts),
                Source::Missing => reconcile(bmark, None, opts),
                Source::Unreadable(cause) => Outcome::MissingFile {
                    cause: Some(cause.clone()),
                },
            };

            Reconciliation {
                id: bmark.id.clone(),
                file: bmark.file.clone(),
                line: bmark.line,
                previous: bmark.status,
                outcome,
            }
        })
        .collect()
}

fn read_source(root: &Path, file: &str) -> Source {
    let path = root.join(file);
    match snapshot::read_file_lines(&path) {
        Ok(lines) => Source::Lines(lines),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Source::Missing,
        Err(err) => {
            log::warn!("cannot read {}: {err}", path.display());
            Source::Unreadable(err.to_string())
        }
    }
}

/// Commit an outcome onto its bookmark. Returns whether line or snapshot
/// changed.
///
/// `checked` and `status` are always refreshed. Line and snapshot only move
/// in [`Mode::Fix`], and only for `valid`/`moved` outcomes.
pub fn apply(bookmark: &mut Bookmark, outcome: &Outcome, mode: Mode, now: DateTime<Utc>) -> bool {
    bookmark.checked = Some(now);

    match (mode, outcome) {
        (
            Mode::Fix,
            Outcome::Moved {
                line, snapshot, ..
            },
        ) => {
            let changed = bookmark.line != *line || bookmark.snapshot != *snapshot;
            bookmark.line = *line;
            bookmark.snapshot = snapshot.clone();
            bookmark.status = Status::Valid;
            changed
        }
        _ => {
            bookmark.status = outcome.status();
            false
        }
    }
}

/// Per-status counts for the end of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub valid: usize,
    pub moved: usize,
    pub stale: usize,
    pub missing_file: usize,
}

impl Summary {
    pub fn from_results(results: &[Reconciliation]) -> Self {
        let mut summary = Summary::default();
        for result in results {
            match result.outcome.status() {
                Status::Valid => summary.valid += 1,
                Status::Moved => summary.moved += 1,
                Status::Stale => summary.stale += 1,
                Status::MissingFile => summary.missing_file += 1,
            }
        }
        summary
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Valid => self.valid,
            Status::Moved => self.moved,
            Status::Stale => self.stale,
            Status::MissingFile => self.missing_file,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.moved + self.stale + self.missing_file
    }
}
