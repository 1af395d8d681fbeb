use super::parser::FieldFilter;
use crate::bookmarks::Bookmark;

pub const DESCRIPTION_WEIGHT: u32 = 4;
pub const TAGS_WEIGHT: u32 = 3;
pub const FILE_WEIGHT: u32 = 2;
pub const CONTEXT_WEIGHT: u32 = 1;

/// Lowercased view of the searchable fields of one bookmark.
pub struct Haystack {
    desc: String,
    tags: Vec<String>,
    file: String,
    target: String,
    context: Vec<String>,
}

impl Haystack {
    pub fn new(bm: &Bookmark) -> Self {
        Self {
            desc: bm.desc.to_lowercase(),
            tags: bm.tags.iter().map(|t| t.to_lowercase()).collect(),
            file: bm.file.to_lowercase(),
            target: bm.snapshot.target.to_lowercase(),
            context: bm.snapshot.context_lines().map(|l| l.to_lowercase()).collect(),
        }
    }
}

pub fn eval_filter(filter: &FieldFilter, hay: &Haystack) -> bool {
    match filter {
        FieldFilter::Tag(tag) => hay.tags.iter().any(|t| t == tag),
        FieldFilter::File(pattern) => hay.file.contains(pattern.as_str()),
    }
}

/// Weight earned by one lowercased term. Each category counts once, however
/// often the term occurs in it; 0 means the term matched nowhere.
pub fn eval_term(term: &str, hay: &Haystack) -> u32 {
    let mut weight = 0;

    if hay.desc.contains(term) {
        weight += DESCRIPTION_WEIGHT;
    }
    if hay.tags.iter().any(|t| t.contains(term)) {
        weight += TAGS_WEIGHT;
    }
    if hay.file.contains(term) || hay.target.contains(term) {
        weight += FILE_WEIGHT;
    }
    if hay.context.iter().any(|l| l.contains(term)) {
        weight += CONTEXT_WEIGHT;
    }

    weight
}
