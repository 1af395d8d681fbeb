#[derive(Debug, Clone, PartialEq)]
pub enum Prefix {
    Tag,  // tag:
    File, // file:
}

impl Prefix {
    const ALL: [(Prefix, &'static str); 2] = [(Prefix::Tag, "tag:"), (Prefix::File, "file:")];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Term(String),
    Prefixed(Prefix, String),
}

/// Classify one raw query token, e.g. one command line argument.
///
/// The token is never split: whitespace inside it stays part of the term or
/// filter value. A single pair of surrounding double quotes is dropped. A
/// prefix with nothing after it (`tag:`) stays a plain term, and a blank
/// token yields nothing.
pub fn classify(raw: &str) -> Option<Token> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((prefix, len)) = match_prefix(raw) {
        let value = unquote(&raw[len..]);
        if !value.is_empty() {
            return Some(Token::Prefixed(prefix, value.to_string()));
        }
    }

    let term = unquote(raw);
    (!term.is_empty()).then(|| Token::Term(term.to_string()))
}

fn match_prefix(raw: &str) -> Option<(Prefix, usize)> {
    Prefix::ALL.into_iter().find_map(|(prefix, text)| {
        raw.get(..text.len())
            .filter(|head| head.eq_ignore_ascii_case(text))
            .map(|_| (prefix, text.len()))
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}
