use thiserror::Error;

/// A single account that the sink refused to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    pub name: String,
    pub message: String,
}

impl std::fmt::Display for InsertFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown metric '{metric}' for platform {platform}")]
    UnknownMetric { platform: String, metric: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{} of {attempted} account inserts failed", failures.len())]
    Commit {
        attempted: usize,
        failures: Vec<InsertFailure>,
    },
}

pub type Result<T> = std::result::Result<T, ImportError>;
