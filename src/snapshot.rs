//! Capturing the text window around a bookmarked line.
//!
//! Source files are handled as a materialized buffer of lines with their
//! terminators removed, so both capture and reconciliation work on plain
//! slices.

use std::path::Path;

use crate::{
    bookmarks::ContextSnapshot,
    errors::{SigilError, SigilResult},
};

/// Split text into lines, dropping `\n` and any trailing `\r`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| trim_terminators(line).to_string())
        .collect()
}

/// Read a source file as UTF-8 lines.
pub fn read_file_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(split_lines(&text))
}

fn trim_terminators(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Byte-for-byte comparison after stripping line terminators.
/// Whitespace and case are significant.
pub fn lines_equal(a: &str, b: &str) -> bool {
    trim_terminators(a) == trim_terminators(b)
}

/// Take `width` lines on each side of the 1-based `line`, clamped at the
/// edges of the buffer.
pub fn capture(lines: &[String], line: usize, width: usize) -> SigilResult<ContextSnapshot> {
    if line == 0 || line > lines.len() {
        return Err(SigilError::LineOutOfRange {
            line,
            len: lines.len(),
        });
    }

    let idx = line - 1;
    let start = idx.saturating_sub(width);
    let end = (idx + 1 + width).min(lines.len());

    Ok(ContextSnapshot {
        before: lines[start..idx].to_vec(),
        target: lines[idx].clone(),
        after: lines[idx + 1..end].to_vec(),
    })
}

/// Read `path` and capture around `line`.
pub fn capture_file(path: &Path, line: usize, width: usize) -> SigilResult<ContextSnapshot> {
    let lines = read_file_lines(path)?;
    capture(&lines, line, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text)
    }

    #[test]
    fn test_split_lines_strips_crlf() {
        assert_eq!(lines("a\r\nb\nc\r"), vec!["a", "b", "c"]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn test_lines_equal_is_strict() {
        assert!(lines_equal("let x = 1;", "let x = 1;\r\n"));
        assert!(!lines_equal("let x = 1;", "  let x = 1;"));
        assert!(!lines_equal("let x = 1;", "let x = 1; "));
        assert!(!lines_equal("Foo", "foo"));
    }

    #[test]
    fn test_capture_middle() {
        let buf = lines("one\ntwo\nthree\nfour");
        let snap = capture(&buf, 2, 1).unwrap();
        assert_eq!(snap.before, vec!["one"]);
        assert_eq!(snap.target, "two");
        assert_eq!(snap.after, vec!["three"]);
    }

    #[test]
    fn test_capture_clamps_at_edges() {
        let buf = lines("one\ntwo\nthree");
        let first = capture(&buf, 1, 2).unwrap();
        assert!(first.before.is_empty());
        assert_eq!(first.after, vec!["two", "three"]);

        let last = capture(&buf, 3, 1).unwrap();
        assert_eq!(last.before, vec!["two"]);
        assert!(last.after.is_empty());
    }

    #[test]
    fn test_capture_out_of_range() {
        let buf = lines("one");
        assert!(matches!(
            capture(&buf, 0, 1),
            Err(SigilError::LineOutOfRange { line: 0, len: 1 })
        ));
        assert!(capture(&buf, 2, 1).is_err());
    }
}
