//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every variant here is fatal: the run
//! aborts before the source directory is traversed.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the operator should *fix*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The layered configuration could not be merged or deserialized.
    #[display("unable to load configuration")]
    Load,
    /// A required field was left empty.
    #[display("missing required option: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A file referenced by the configuration does not exist.
    #[display("file not found: {}", _0.display())]
    MissingFile(#[error(not(source))] PathBuf),
    /// The source path is not a readable directory.
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// A field was present but its value is unusable.
    #[display("invalid value for '{field}': {value}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is either valid or it isn't; the operator has to
        // change something before trying again.
        false
    }
}
