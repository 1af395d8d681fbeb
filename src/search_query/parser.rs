use super::lexer::{Prefix, Token};

/// Hard inclusion predicate, applied before any scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Case-insensitive equality with one of the tags.
    Tag(String),
    /// Case-insensitive substring of the file path.
    File(String),
}

/// Parsed query: filters plus free terms, all lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub filters: Vec<FieldFilter>,
    pub terms: Vec<String>,
}

impl SearchQuery {
    /// No filters and no terms. Such a query matches nothing.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.terms.is_empty()
    }
}

pub fn parse(tokens: Vec<Token>) -> SearchQuery {
    let mut query = SearchQuery::default();

    for token in tokens {
        match token {
            Token::Term(term) => query.terms.push(term.to_lowercase()),
            Token::Prefixed(prefix, value) => {
                let value = value.to_lowercase();
                query.filters.push(match prefix {
                    Prefix::Tag => FieldFilter::Tag(value),
                    Prefix::File => FieldFilter::File(value),
                });
            }
        }
    }

    query
}
