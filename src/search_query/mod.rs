//! Ranked multi-term bookmark search.
//!
//! Query syntax:
//! - `tag:<value>`: the bookmark must carry this tag (case-insensitive)
//! - `file:<value>`: the file path must contain the value
//! - anything else is a free term; every free term has to match somewhere
//!
//! Each raw token is taken whole, so `"cache miss"` passed as one argument
//! is a single phrase term and `file:my dir/x.rs` a single filter.
mod eval;
mod lexer;
mod parser;
mod rank;

use crate::bookmarks::Bookmark;

pub use parser::SearchQuery;
pub use rank::{rank, Ranked};

/// Parse raw query tokens, e.g. one per command line argument.
pub fn parse<S: AsRef<str>>(raw: &[S]) -> SearchQuery {
    let tokens = raw
        .iter()
        .filter_map(|arg| lexer::classify(arg.as_ref()))
        .collect();
    parser::parse(tokens)
}

/// Convenience: parse + rank in one call.
pub fn search<'a, S: AsRef<str>>(
    bookmarks: &'a [Bookmark],
    raw: &[S],
    limit: Option<usize>,
) -> Vec<Ranked<'a>> {
    let query = parse(raw);
    log::debug!(
        "search: {} filter(s), {} term(s)",
        query.filters.len(),
        query.terms.len()
    );
    rank(bookmarks, &query, limit)
}
