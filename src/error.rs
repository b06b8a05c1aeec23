use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// A station file or one of its rows could not be read into its expected shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("missing header line {line}")]
    MissingLine { line: usize },

    #[error("header line {line} has no ';' separator: '{content}'")]
    MissingSeparator { line: usize, content: String },

    #[error("invalid date: '{0}'")]
    InvalidDate(String),

    #[error("invalid time: '{0}'")]
    InvalidTime(String),

    #[error("expected at least {expected} cells, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("unexpected value '{value}' in cell {index}")]
    UnexpectedCell { index: usize, value: String },

    #[error("undecodable row: {0}")]
    Decoding(String),
}

/// A malformed data row. Rows are dropped individually; the file carries on.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {error}")]
pub struct RowError {
    pub line: usize,
    pub error: FormatError,
}

/// How far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureScope {
    File,
    Archive,
    Run,
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid station file {path}: {error}")]
    Format { path: PathBuf, error: FormatError },

    #[error("Station '{name}' (WMO {wmo_code}) is stored {count} times")]
    IdentityConflict {
        name: String,
        wmo_code: String,
        count: i64,
    },

    #[error("Archive {path} could not be expanded: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Unreadable stored value: {0}")]
    StoredValue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing cancelled by user")]
    Cancelled,

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub fn format(path: impl Into<PathBuf>, error: FormatError) -> Self {
        ProcessingError::Format {
            path: path.into(),
            error,
        }
    }

    /// Which unit of work has to be abandoned when this error surfaces.
    pub fn scope(&self) -> FailureScope {
        match self {
            ProcessingError::Format { .. }
            | ProcessingError::IdentityConflict { .. }
            | ProcessingError::Io(_)
            | ProcessingError::Database(_) => FailureScope::File,
            ProcessingError::Zip(_) | ProcessingError::Archive { .. } => FailureScope::Archive,
            ProcessingError::StoredValue(_)
            | ProcessingError::Config(_)
            | ProcessingError::Json(_)
            | ProcessingError::InvalidInput(_)
            | ProcessingError::Cancelled
            | ProcessingError::TaskJoin(_) => FailureScope::Run,
        }
    }
}

impl From<config::ConfigError> for ProcessingError {
    fn from(err: config::ConfigError) -> Self {
        ProcessingError::Config(err.to_string())
    }
}
