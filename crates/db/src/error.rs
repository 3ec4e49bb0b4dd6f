//! Error type shared by every store backend.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by a `ProductionStore`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key: {message}")]
    DuplicateKey { message: String },

    #[error("user '{user}' already exists on database '{database}'")]
    DuplicateUser { user: String, database: String },

    #[error("index '{name}' conflicts with an existing index")]
    IndexConflict { name: String },

    #[error("malformed production document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

impl StoreError {
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// True for unique-index violations, whichever backend raised them.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
