//! On-disk layout:
//!
//! ```text
//! .sigil/
//!   bookmarks.jsonl   one compact JSON record per bookmark
//!   contexts/<id>.ctx raw snapshot text, no escaping
//! ```
use std::{
    collections::HashSet,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    bookmarks::{Bookmark, ContextSnapshot},
    errors::{SigilError, SigilResult},
};

pub const BOOKMARKS_FILE: &str = "bookmarks.jsonl";
pub const CONTEXTS_DIR: &str = "contexts";
const CONTEXT_EXT: &str = ".ctx";

/// Marks the target line inside a `.ctx` file.
const TARGET_MARKER: &str = ">>> ";
/// Indents the surrounding lines so they line up with the target.
const CONTEXT_INDENT: &str = "    ";

pub trait StorageManager: Send + Sync {
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()>;
    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>>;
    fn exists(&self, ident: &str) -> bool;
    fn delete(&self, ident: &str) -> std::io::Result<()>;
    fn list(&self) -> Vec<String>;
}

#[derive(Clone)]
pub struct BackendLocal {
    pub base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(BackendLocal { base_dir })
    }
}

impl StorageManager for BackendLocal {
    fn exists(&self, ident: &str) -> bool {
        self.base_dir.join(ident).is_file()
    }

    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.base_dir.join(ident))
    }

    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()> {
        write_atomic(&self.base_dir.join(ident), data)
    }

    fn delete(&self, ident: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.base_dir.join(ident))
    }

    fn list(&self) -> Vec<String> {
        std::fs::read_dir(&self.base_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| {
                        let path = entry.path();
                        if path.is_file() {
                            path.file_name()
                                .and_then(|name| name.to_str())
                                .map(|s| s.to_string())
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Write to a temp file next to `path`, then rename it over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub fn encode_snapshot(snapshot: &ContextSnapshot) -> String {
    let mut out = String::new();
    for line in &snapshot.before {
        out.push_str(CONTEXT_INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(TARGET_MARKER);
    out.push_str(&snapshot.target);
    out.push('\n');
    for line in &snapshot.after {
        out.push_str(CONTEXT_INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// `None` if no line carries the target marker.
pub fn decode_snapshot(text: &str) -> Option<ContextSnapshot> {
    let lines = crate::snapshot::split_lines(text);
    let target_idx = lines.iter().position(|l| l.starts_with(TARGET_MARKER))?;

    let unindent = |line: &String| {
        line.strip_prefix(CONTEXT_INDENT)
            .unwrap_or(line)
            .to_string()
    };

    Some(ContextSnapshot {
        before: lines[..target_idx].iter().map(unindent).collect(),
        target: lines[target_idx][TARGET_MARKER.len()..].to_string(),
        after: lines[target_idx + 1..].iter().map(unindent).collect(),
    })
}

/// Bookmarks read from disk plus whatever had to be skipped on the way.
#[derive(Debug, Default)]
pub struct Loaded {
    pub bookmarks: Vec<Bookmark>,
    pub warnings: Vec<SigilError>,
}

pub struct BookmarkStore {
    path: PathBuf,
    contexts: Box<dyn StorageManager>,
    /// Raw lines that failed to parse, written back untouched on save.
    malformed: Vec<Vec<u8>>,
}

impl BookmarkStore {
    /// Open the store inside `sigil_dir`, creating missing files.
    pub fn open(sigil_dir: &Path) -> SigilResult<Self> {
        let path = sigil_dir.join(BOOKMARKS_FILE);
        if let Err(err) = std::fs::metadata(&path) {
            match err.kind() {
                ErrorKind::NotFound => {
                    log::info!("Creating new bookmark store at {}", path.display());
                    std::fs::write(&path, "")?;
                }
                _ => Err(err)?,
            }
        }

        let contexts = BackendLocal::new(sigil_dir.join(CONTEXTS_DIR))?;

        Ok(BookmarkStore {
            path,
            contexts: Box::new(contexts),
            malformed: vec![],
        })
    }

    /// Read every record. Malformed lines are skipped and reported rather
    /// than failing the whole load.
    pub fn load(&mut self) -> SigilResult<Loaded> {
        let now = Instant::now();
        let data = std::fs::read(&self.path)?;

        let mut loaded = Loaded::default();
        self.malformed.clear();

        for (idx, raw) in data.split(|b| *b == b'\n').enumerate() {
            let raw = raw.trim_ascii();
            if raw.is_empty() {
                continue;
            }

            let parsed = std::str::from_utf8(raw)
                .map_err(|err| format!("not valid utf-8: {err}"))
                .and_then(parse_record);

            match parsed {
                Ok(mut bmark) => {
                    bmark.snapshot = self.load_snapshot(&bmark, &mut loaded.warnings);
                    loaded.bookmarks.push(bmark);
                }
                Err(message) => {
                    log::warn!("skipping line {} of {}: {message}", idx + 1, self.path.display());
                    self.malformed.push(raw.to_vec());
                    loaded.warnings.push(SigilError::MalformedRecord {
                        line: idx + 1,
                        message,
                    });
                }
            }
        }

        log::debug!(
            "took {}ms to read {} bookmarks",
            now.elapsed().as_micros() as f64 / 1000.0,
            loaded.bookmarks.len()
        );

        Ok(loaded)
    }

    fn load_snapshot(&self, bmark: &Bookmark, warnings: &mut Vec<SigilError>) -> ContextSnapshot {
        let ident = context_ident(&bmark.id);
        let raw = match self.contexts.read(&ident) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::warn!("no snapshot for {}", bmark.id);
                return ContextSnapshot::default();
            }
            Err(err) => {
                log::warn!("cannot read snapshot for {}: {err}", bmark.id);
                warnings.push(err.into());
                return ContextSnapshot::default();
            }
        };

        let decoded = String::from_utf8(raw)
            .ok()
            .and_then(|text| decode_snapshot(&text));

        decoded.unwrap_or_else(|| {
            log::warn!("snapshot for {} has no target line", bmark.id);
            ContextSnapshot::default()
        })
    }

    pub fn save(&self, bookmarks: &[Bookmark]) -> SigilResult<()> {
        let mut out = Vec::new();
        for bmark in bookmarks {
            serde_json::to_writer(&mut out, bmark)?;
            out.push(b'\n');
        }
        for raw in &self.malformed {
            out.extend_from_slice(raw);
            out.push(b'\n');
        }
        write_atomic(&self.path, &out)?;

        let mut keep = HashSet::new();
        for bmark in bookmarks {
            let ident = context_ident(&bmark.id);
            self.contexts
                .write(&ident, encode_snapshot(&bmark.snapshot).as_bytes())?;
            keep.insert(ident);
        }
        // snapshots of unparseable records stay around for a later repair
        for raw in &self.malformed {
            if let Some(id) = raw_record_id(raw) {
                keep.insert(context_ident(&id));
            }
        }

        for ident in self.contexts.list() {
            if ident.ends_with(CONTEXT_EXT) && !keep.contains(&ident) {
                log::debug!("removing orphaned snapshot {ident}");
                if let Err(err) = self.contexts.delete(&ident) {
                    log::warn!("failed to remove {ident}: {err}");
                }
            }
        }

        Ok(())
    }
}

fn context_ident(id: &str) -> String {
    format!("{id}{CONTEXT_EXT}")
}

fn parse_record(raw: &str) -> Result<Bookmark, String> {
    let bmark: Bookmark = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if bmark.line == 0 {
        return Err("line must be 1 or greater".to_string());
    }
    if !is_valid_id(&bmark.id) {
        return Err(format!("invalid id '{}'", bmark.id));
    }
    Ok(bmark)
}

/// Ids name `.ctx` files, so only `[A-Za-z0-9_-]` is allowed.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn raw_record_id(raw: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(raw).ok()?;
    value
        .get("id")?
        .as_str()
        .filter(|id| is_valid_id(id))
        .map(String::from)
}
