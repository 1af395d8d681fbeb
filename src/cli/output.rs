use serde::Serialize;

use crate::{
    bookmarks::{Bookmark, ContextSnapshot, Status},
    reconcile::{Reconciliation, Summary},
    search_query::Ranked,
};

const FILE_WIDTH: usize = 35;
const TAGS_WIDTH: usize = 20;
const DESC_WIDTH: usize = 45;

/// JSON shape of a bookmark: the record plus its snapshot.
#[derive(Serialize)]
pub struct BookmarkView<'a> {
    #[serde(flatten)]
    pub bookmark: &'a Bookmark,
    pub context: &'a ContextSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl<'a> From<&'a Bookmark> for BookmarkView<'a> {
    fn from(bookmark: &'a Bookmark) -> Self {
        Self {
            bookmark,
            context: &bookmark.snapshot,
            score: None,
        }
    }
}

impl<'a> From<&Ranked<'a>> for BookmarkView<'a> {
    fn from(ranked: &Ranked<'a>) -> Self {
        Self {
            bookmark: ranked.bookmark,
            context: &ranked.bookmark.snapshot,
            score: Some(ranked.score),
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out = value.chars().take(width.saturating_sub(3)).collect::<String>();
    out.push_str("...");
    out
}

fn row(bmark: &Bookmark) -> Vec<String> {
    let desc = bmark.desc.lines().next().unwrap_or_default();
    vec![
        bmark.short_id().to_string(),
        bmark.file.clone(),
        bmark.line.to_string(),
        bmark.tags.join(","),
        truncate(desc, DESC_WIDTH),
        bmark.status.to_string(),
    ]
}

fn print_rows(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in &rows {
        for (idx, value) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(value.chars().count());
        }
    }

    // cap widths for readability
    widths[1] = widths[1].min(FILE_WIDTH);
    widths[3] = widths[3].min(TAGS_WIDTH);
    widths[4] = widths[4].min(DESC_WIDTH);

    let format_row = |values: Vec<String>| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| {
                let width = *width;
                let value = value.chars().take(width).collect::<String>();
                format!("{value:<width$}")
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!(
        "{}",
        format_row(headers.iter().map(|h| h.to_string()).collect())
    );
    println!(
        "{}",
        format_row(widths.iter().map(|w| "─".repeat(*w)).collect())
    );
    for row in rows {
        println!("{}", format_row(row));
    }
}

pub fn print_table(bookmarks: &[&Bookmark]) {
    let rows = bookmarks.iter().map(|b| row(b)).collect();
    print_rows(&["ID", "FILE", "LINE", "TAGS", "DESCRIPTION", "STATUS"], rows);
}

pub fn print_ranked(results: &[Ranked]) {
    let rows = results
        .iter()
        .map(|r| {
            let mut row = row(r.bookmark);
            row.push(r.score.to_string());
            row
        })
        .collect();
    print_rows(
        &["ID", "FILE", "LINE", "TAGS", "DESCRIPTION", "STATUS", "SCORE"],
        rows,
    );
}

pub fn print_details(bm: &Bookmark) {
    let fmt_ts = |ts: &Option<chrono::DateTime<chrono::Utc>>| {
        ts.map(|ts| ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, false))
            .unwrap_or_else(|| "never".to_string())
    };

    println!("Bookmark: {}", bm.id);
    println!("File: {}:{}", bm.file, bm.line);
    if bm.tags.is_empty() {
        println!("Tags: (none)");
    } else {
        println!("Tags: {}", bm.tags.join(", "));
    }
    if bm.desc.is_empty() {
        println!("Description: (none)");
    } else {
        println!("Description: {}", bm.desc);
    }
    println!("Created: {}", fmt_ts(&bm.created));
    println!("Last accessed: {}", fmt_ts(&bm.accessed));
    println!("Status: {} (checked {})", bm.status, fmt_ts(&bm.checked));
    println!();
    println!("Context:");

    let snap = &bm.snapshot;
    let first = bm.line.saturating_sub(snap.before.len());
    for (offset, line) in snap.before.iter().enumerate() {
        println!("  {:>4} │ {line}", first + offset);
    }
    println!("→ {:>4} │ {}", bm.line, snap.target);
    for (offset, line) in snap.after.iter().enumerate() {
        println!("  {:>4} │ {line}", bm.line + 1 + offset);
    }
}

pub fn print_validation(results: &[Reconciliation], summary: &Summary) {
    println!("Validated {} bookmark(s):\n", summary.total());

    for status in Status::ALL {
        let count = summary.count(status);
        if count == 0 {
            continue;
        }
        println!("  {} {status}: {count}", status.icon());

        if status == Status::Valid {
            continue;
        }
        for result in results.iter().filter(|r| r.outcome.status() == status) {
            println!(
                "    {} {}:{} - {}",
                result.id.short(),
                result.file,
                result.line,
                result.message()
            );
        }
    }
}
