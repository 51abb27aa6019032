//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Traversal and read failures are
//! fatal for the run; a dangling redirect is never an error, the entry is
//! simply dropped.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An entry-production error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for entry-production operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A directory of the source tree could not be listed.
    #[display("unable to traverse directory: {}", _0.display())]
    Traversal(#[error(not(source))] PathBuf),
    /// A file disappeared or became unreadable after it was discovered.
    #[display("unable to read file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// A line of the redirects file could not be understood.
    #[display("invalid redirect at {}:{line}: {reason}", path.display())]
    Redirect {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// A payload was requested for an id that was never emitted.
    #[display("unknown entry: {_0}")]
    UnknownEntry(#[error(not(source))] String),
    /// The archive writer could not persist an entry.
    #[display("archive writer failed")]
    Writer,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Writer)
    }
}
