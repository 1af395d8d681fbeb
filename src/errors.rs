#[derive(thiserror::Error, Debug)]
pub enum SigilError {
    #[error("no bookmark matching '{0}'")]
    NotFound(String),

    #[error("ambiguous id '{partial}', matches: {}", candidates.join(", "))]
    Ambiguous {
        partial: String,
        candidates: Vec<String>,
    },

    #[error("malformed record on line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error(
        "not in a sigil project, run 'sigil init' first \
         or navigate to a directory with .sigil/ or .git/"
    )]
    NotInProject,

    #[error("invalid location: {0}")]
    InvalidLocation(String),

    #[error("line {line} out of range (file has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("editor error: {0}")]
    Editor(String),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

pub type SigilResult<T> = Result<T, SigilError>;
