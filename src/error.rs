//! Error types for the postindex library.
//!
//! All fallible operations return [`PostindexError`] through the crate-wide
//! [`Result`] alias. The variants follow how a failure must be handled by the
//! content-mutation workflow that owns the transaction:
//!
//! - [`PostindexError::Validation`] — the body was rejected before any
//!   tokenization; the save fails.
//! - [`PostindexError::Conflict`] — a unique-constraint race reported by the
//!   store; retried internally.
//! - [`PostindexError::Transient`] — retries were exhausted; the caller may
//!   retry the whole save.
//! - [`PostindexError::Storage`] — the store is unavailable; the caller must
//!   roll the transaction back.
//!
//! Unresolved mentions are not errors at all, see
//! [`ExtractionWarning`](crate::extract::ExtractionWarning).
//!
//! # Examples
//!
//! ```
//! use postindex::error::{PostindexError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PostindexError::validation("body contains a NUL byte"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for postindex operations.
#[derive(Error, Debug)]
pub enum PostindexError {
    /// Malformed input (non-UTF-8, NUL bytes, oversize bodies).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness race lost against a concurrent writer.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A recoverable failure that exhausted its retry budget.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The underlying storage failed or is unavailable.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O errors (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from host-provided store implementations.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PostindexError.
pub type Result<T> = std::result::Result<T, PostindexError>;

impl PostindexError {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        PostindexError::Validation(msg.into())
    }

    /// Create a new conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        PostindexError::Conflict(msg.into())
    }

    /// Create a new transient error.
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        PostindexError::Transient(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        PostindexError::Storage(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PostindexError::Config(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        PostindexError::Analysis(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        PostindexError::NotFound(msg.into())
    }

    /// Whether the operation may succeed when retried as-is.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PostindexError::Conflict(_))
    }

    /// Whether the failure should be shown to the end user.
    ///
    /// Only rejected input and storage outages are user-visible; everything
    /// else is enrichment the save can live without or retry. Errors raised
    /// by host stores arrive as [`PostindexError::Anyhow`] and count as
    /// storage failures.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            PostindexError::Validation(_) | PostindexError::Storage(_) | PostindexError::Anyhow(_)
        )
    }
}
