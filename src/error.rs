//! Error types for the athlete sync pipeline

use crate::cli::types::Sport;
use thiserror::Error;


pub type Result<T> = std::result::Result<T, SyncError>;

/// How far an error is allowed to propagate.
///
/// Row-scoped errors are logged and the loop moves on to the next row.
/// Phase-scoped errors abort the current phase (or job) only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Row,
    Phase,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Provider returned status {status} for {endpoint}")]
    Provider { endpoint: String, status: u16 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Template shape mismatch at {path}: {reason}")]
    TemplateShape { path: String, reason: String },

    #[error("Template could not be parsed: {message}")]
    TemplateParse { message: String },

    #[error("Template not found: {path}")]
    TemplateMissing { path: String },

    #[error("Invalid node path: {path}")]
    InvalidPath { path: String },

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Provider returned no current timeframe for {sport}")]
    MissingTimeframe { sport: Sport },

    #[error("{env_var} environment variable not set")]
    MissingConfig { env_var: String },

    #[error("Invalid value for {env_var}: {message}")]
    InvalidConfig { env_var: String, message: String },

    #[error("Invalid sport: {sport}")]
    InvalidSport { sport: String },

    #[error("{phase} sync for {sport} is already running")]
    PhaseLocked { sport: Sport, phase: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

impl SyncError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn template_shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TemplateShape {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn upload(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Classify the error for the row-vs-phase propagation policy.
    pub fn scope(&self) -> ErrorScope {
        match self {
            SyncError::NotFound { .. }
            | SyncError::TemplateShape { .. }
            | SyncError::TemplateParse { .. }
            | SyncError::TemplateMissing { .. }
            | SyncError::InvalidPath { .. }
            | SyncError::Upload { .. } => ErrorScope::Row,
            // One bad row (a CHECK, NOT NULL or trigger rejection); the
            // connection itself is fine.
            SyncError::Storage(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ErrorScope::Row
            }
            _ => ErrorScope::Phase,
        }
    }

    pub fn is_row_scoped(&self) -> bool {
        self.scope() == ErrorScope::Row
    }
}
