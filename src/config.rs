use std::path::{Path, PathBuf};

use crate::{
    errors::{SigilError, SigilResult},
    reconcile::{ReconcileOptions, DEFAULT_CONTEXT_LINES, DEFAULT_SEARCH_RADIUS},
    storage::{self, StorageManager},
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";
/// Upper bound for capture width on each side of the target.
const MAX_CONTEXT_LINES: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Lines searched above and below the recorded line before falling back
    /// to a scan of the whole file.
    #[serde(default = "default_search_radius")]
    pub search_radius: usize,

    /// Lines captured on each side of a bookmarked line.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Result cap for `search` when `--limit` is not given.
    #[serde(default)]
    pub search_limit: Option<usize>,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            context_lines: DEFAULT_CONTEXT_LINES,
            search_limit: None,
            base_path: PathBuf::new(),
        }
    }
}

fn default_search_radius() -> usize {
    DEFAULT_SEARCH_RADIUS
}

fn default_context_lines() -> usize {
    DEFAULT_CONTEXT_LINES
}

impl Config {
    fn validate(&self) -> SigilResult<()> {
        if self.search_radius == 0 {
            return Err(SigilError::Config(
                "search_radius must be greater than 0".to_string(),
            ));
        }

        if self.context_lines > MAX_CONTEXT_LINES {
            return Err(SigilError::Config(format!(
                "context_lines must be between 0 and {MAX_CONTEXT_LINES}, got {}",
                self.context_lines
            )));
        }

        Ok(())
    }

    pub fn load_with(base_path: &Path) -> SigilResult<Self> {
        let store = storage::BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .map_err(|_| SigilError::Config("config file is not valid utf8".to_string()))?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> SigilResult<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            search_radius: self.search_radius,
            context_lines: self.context_lines,
        }
    }
}
