use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    errors::{SigilError, SigilResult},
    storage::{BookmarkStore, Loaded, CONTEXTS_DIR},
};

pub const SIGIL_DIR: &str = ".sigil";
/// Overrides root discovery.
pub const ROOT_ENV: &str = "SIGIL_ROOT";

/// Walk up from `start` looking for `.sigil/`, then again for `.git`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    let ancestors = || start.ancestors();

    ancestors()
        .find(|dir| dir.join(SIGIL_DIR).is_dir())
        .or_else(|| ancestors().find(|dir| dir.join(".git").exists()))
        .map(Path::to_path_buf)
}

/// Create the `.sigil/` layout under `root`. Returns its path.
pub fn ensure_layout(root: &Path) -> SigilResult<PathBuf> {
    let sigil_dir = root.join(SIGIL_DIR);
    std::fs::create_dir_all(sigil_dir.join(CONTEXTS_DIR))?;
    Ok(sigil_dir)
}

/// Path of `file` relative to `root`, or the absolute path if it lies
/// outside the project.
pub fn relative_path(file: &Path, root: &Path) -> String {
    let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    match file.strip_prefix(&root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => file.to_string_lossy().to_string(),
    }
}

/// An opened project: root, config and bookmark store.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    store: BookmarkStore,
}

impl Project {
    /// Locate the project from the environment or the working directory.
    pub fn discover() -> SigilResult<Self> {
        let root = match std::env::var(ROOT_ENV) {
            Ok(root) if !root.is_empty() => PathBuf::from(root),
            _ => {
                let cwd = std::env::current_dir()?;
                find_root(&cwd).ok_or(SigilError::NotInProject)?
            }
        };
        Self::open(&root)
    }

    pub fn open(root: &Path) -> SigilResult<Self> {
        let sigil_dir = ensure_layout(root)?;
        let config = Config::load_with(&sigil_dir)?;
        let store = BookmarkStore::open(&sigil_dir)?;
        log::debug!("project root {}", root.display());

        Ok(Project {
            root: root.to_path_buf(),
            config,
            store,
        })
    }

    pub fn load(&mut self) -> SigilResult<Loaded> {
        self.store.load()
    }

    pub fn save(&self, bookmarks: &[crate::bookmarks::Bookmark]) -> SigilResult<()> {
        self.store.save(bookmarks)
    }

    /// Absolute path of a stored (root-relative) file.
    pub fn resolve(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Turn a user supplied path into the stored form.
    pub fn relativize(&self, input: &Path) -> SigilResult<String> {
        let abs = if input.is_absolute() {
            input.to_path_buf()
        } else {
            std::env::current_dir()?.join(input)
        };
        Ok(relative_path(&abs, &self.root))
    }
}
