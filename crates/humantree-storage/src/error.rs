//! Storage error types for humantree-storage.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration failure while opening a database.
    #[error("migration error: {0}")]
    Migration(String),

    /// A tree with the given ID was not found.
    #[error("tree not found: {0}")]
    TreeNotFound(i64),

    /// A persisted skill referenced by a save payload was not found.
    #[error("skill not found: tree={tree}, skill={skill}")]
    SkillNotFound { tree: i64, skill: i64 },

    /// The tree payload failed structural validation.
    #[error("invalid tree: {reason}")]
    InvalidTree { reason: String },

    /// A data integrity violation was detected.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
