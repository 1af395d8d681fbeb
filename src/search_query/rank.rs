use std::cmp::Ordering;

use super::{
    eval::{eval_filter, eval_term, Haystack},
    parser::SearchQuery,
};
use crate::bookmarks::Bookmark;

#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a> {
    pub bookmark: &'a Bookmark,
    pub score: u32,
}

/// Filter, score, order and truncate.
///
/// A bookmark is dropped if it fails any field filter or if any free term
/// matches none of its fields. Survivors are ordered by score, then most
/// recently accessed, then id.
pub fn rank<'a>(bookmarks: &'a [Bookmark], query: &SearchQuery, limit: Option<usize>) -> Vec<Ranked<'a>> {
    if query.is_empty() {
        return vec![];
    }

    let mut results = bookmarks
        .iter()
        .filter_map(|bookmark| {
            let hay = Haystack::new(bookmark);

            if !query.filters.iter().all(|f| eval_filter(f, &hay)) {
                return None;
            }

            let mut score = 0;
            for term in &query.terms {
                match eval_term(term, &hay) {
                    0 => return None,
                    weight => score += weight,
                }
            }

            Some(Ranked { bookmark, score })
        })
        .collect::<Vec<_>>();

    results.sort_by(compare);

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    results
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    b.score
        .cmp(&a.score)
        // Some(_) > None, so never-accessed bookmarks land last
        .then_with(|| b.bookmark.accessed.cmp(&a.bookmark.accessed))
        .then_with(|| a.bookmark.id.cmp(&b.bookmark.id))
}
