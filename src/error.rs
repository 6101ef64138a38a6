//! Error types for capquery.
//!
//! This module provides structured error types for all capquery operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`FilterError`] - Errors from filter expression parsing
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for capquery operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller passed a malformed argument (empty filter id, unknown filter id).
    /// Always a caller bug; never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Filter expression failed to compile
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Flat layer stream from the engine violates the single-rooted-tree
    /// invariant. Indicates engine/client desynchronization.
    #[error("Malformed frame data: {reason}")]
    MalformedFrameData { reason: String },

    /// Reader/writer requested for a source id the engine does not recognize
    #[error("Unregistered source: {id}")]
    UnregisteredSource { id: String },
}

impl Error {
    /// Create a `MalformedFrameData` error with a reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedFrameData {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during filter expression parsing.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Syntax error with the byte offset of the offending position
    #[error("Syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Empty filter expression
    #[error("Empty filter expression")]
    EmptyFilter,
}

impl FilterError {
    /// Create a syntax error at the given source offset.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        FilterError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
