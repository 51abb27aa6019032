//! Binary Error Types
//!
//! Each variant names the stage of the run that failed; the error tree
//! underneath carries the library error that caused it.

use derive_more::{Display, Error};

/// A run error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for a run.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded or failed validation.
    #[display("invalid configuration")]
    Config,
    /// The async runtime hosting the directory walker could not start.
    #[display("unable to start runtime")]
    Runtime,
    /// Traversal, rewriting or writing failed part way through.
    #[display("packaging failed")]
    Package,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Runtime | Self::Package)
    }
}
