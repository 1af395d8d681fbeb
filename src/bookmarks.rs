use crate::{
    eid::Eid,
    errors::{SigilError, SigilResult},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Result of the last reconciliation. Only the reconciler decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Valid,
    Moved,
    Stale,
    MissingFile,
}

impl Status {
    /// Display order used by summaries.
    pub const ALL: [Status; 4] = [
        Status::Valid,
        Status::Moved,
        Status::Stale,
        Status::MissingFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Valid => "valid",
            Status::Moved => "moved",
            Status::Stale => "stale",
            Status::MissingFile => "missing_file",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Status::Valid => "✓",
            Status::Moved => "→",
            Status::Stale => "?",
            Status::MissingFile => "✗",
        }
    }

    /// Needs a human decision before it can be trusted again.
    pub fn is_broken(&self) -> bool {
        matches!(self, Status::Stale | Status::MissingFile)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text around the bookmarked line at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub before: Vec<String>,
    pub target: String,
    pub after: Vec<String>,
}

impl ContextSnapshot {
    /// Every surrounding line, before and after the target.
    pub fn context_lines(&self) -> impl Iterator<Item = &String> {
        self.before.iter().chain(self.after.iter())
    }
}

#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Eid,
    pub file: String,
    pub line: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub status: Status,

    #[serde(default, with = "timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub accessed: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub checked: Option<DateTime<Utc>>,

    /// Lives in its own `.ctx` file, never in the record line.
    #[serde(skip)]
    pub snapshot: ContextSnapshot,
}

impl Hash for Bookmark {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Bookmark {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookmarkCreate {
    pub file: String,
    pub line: usize,
    pub tags: Vec<String>,
    pub desc: String,
    pub snapshot: ContextSnapshot,
}

impl Bookmark {
    pub fn create(create: BookmarkCreate, now: DateTime<Utc>) -> Self {
        Bookmark {
            id: Eid::new(),
            file: create.file,
            line: create.line,
            tags: create.tags,
            desc: create.desc,
            status: Status::Valid,
            created: Some(now),
            accessed: Some(now),
            checked: Some(now),
            snapshot: create.snapshot,
        }
    }

    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

/// Split a comma separated tag argument, dropping blanks.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

pub fn now() -> DateTime<Utc> {
    // stored with second precision, keep in-memory values identical
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

/// Resolve a full or partial id. A full id wins over substring matches.
pub fn find_index(bookmarks: &[Bookmark], partial: &str) -> SigilResult<usize> {
    if let Some(idx) = bookmarks.iter().position(|b| b.id.as_str() == partial) {
        return Ok(idx);
    }

    let matches = bookmarks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.id.contains(partial))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(SigilError::NotFound(partial.to_string())),
        [idx] => Ok(*idx),
        _ => Err(SigilError::Ambiguous {
            partial: partial.to_string(),
            candidates: matches
                .iter()
                .map(|idx| bookmarks[*idx].id.to_string())
                .collect(),
        }),
    }
}

/// RFC 3339 with second precision; the empty string means "never".
mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, false)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }

        DateTime::parse_from_rfc3339(raw.trim())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(id: &str) -> Bookmark {
        Bookmark {
            id: Eid::from(id),
            file: "src/lib.rs".into(),
            line: 1,
            tags: vec![],
            desc: String::new(),
            status: Status::Valid,
            created: None,
            accessed: None,
            checked: None,
            snapshot: ContextSnapshot::default(),
        }
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("perf, cache,,  "), vec!["perf", "cache"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_find_index_partial() {
        let bmarks = vec![bookmark("bm_100_aaaa"), bookmark("bm_200_bbbb")];
        assert_eq!(find_index(&bmarks, "bbbb").unwrap(), 1);
        assert!(matches!(
            find_index(&bmarks, "cccc"),
            Err(SigilError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_index_ambiguous_lists_candidates() {
        let bmarks = vec![bookmark("bm_100_aaaa"), bookmark("bm_100_aaab")];
        match find_index(&bmarks, "bm_100") {
            Err(SigilError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["bm_100_aaaa", "bm_100_aaab"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_find_index_full_id_wins() {
        let bmarks = vec![bookmark("bm_1_ab"), bookmark("bm_1_abc")];
        assert_eq!(find_index(&bmarks, "bm_1_ab").unwrap(), 0);
    }

    #[test]
    fn test_record_json_shape() {
        let mut bmark = bookmark("bm_1_abcd");
        bmark.status = Status::MissingFile;
        bmark.created = DateTime::from_timestamp(1_700_000_000, 0);

        let json = serde_json::to_value(&bmark).unwrap();
        assert_eq!(json["status"], "missing_file");
        assert_eq!(json["created"], "2023-11-14T22:13:20+00:00");
        assert_eq!(json["checked"], "");
        assert!(json.get("snapshot").is_none());
    }

    #[test]
    fn test_record_defaults_and_unknown_status() {
        let bmark: Bookmark =
            serde_json::from_str(r#"{"id":"bm_1_abcd","file":"a.rs","line":3}"#).unwrap();
        assert_eq!(bmark.status, Status::Valid);
        assert!(bmark.tags.is_empty());
        assert!(bmark.accessed.is_none());

        let err = serde_json::from_str::<Bookmark>(
            r#"{"id":"bm_1_abcd","file":"a.rs","line":3,"status":"unknown"}"#,
        );
        assert!(err.is_err());
    }
}
