use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use std::str::FromStr;
use std::{fmt::Display, ops::Deref};

/// Characters of the id shown in tables and messages.
const SHORT_LEN: usize = 8;

/// Bookmark identifier of the form `bm_<unix-seconds>_<4 hex>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct Eid(String);

impl Display for Eid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Eid {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Eid(s.to_string()))
    }
}

impl Deref for Eid {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Eid {
    fn from(fr: &str) -> Self {
        Eid(fr.to_string())
    }
}

impl From<String> for Eid {
    fn from(fr: String) -> Self {
        Eid(fr)
    }
}

impl From<Eid> for String {
    fn from(fr: Eid) -> Self {
        fr.0
    }
}

impl Eid {
    pub fn new() -> Eid {
        let ts = chrono::Utc::now().timestamp();
        let nonce: u64 = rand::random();

        let mut hasher = Sha256::new();
        hasher.update(format!("{ts}{nonce}").as_bytes());
        let digest = hasher.finalize();

        Eid(format!("bm_{ts}_{:02x}{:02x}", digest[0], digest[1]))
    }

    /// Last few characters, unique enough for display.
    pub fn short(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(SHORT_LEN - 1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl Default for Eid {
    fn default() -> Self {
        Self::new()
    }
}
