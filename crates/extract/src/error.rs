//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Not enough bytes could be read to identify the file.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// A string was expected to be a book identifier, but isn't one.
    #[display("invalid book id: {_0:?}")]
    InvalidId(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Identifiers are either valid or they're not, and an empty file
        // doesn't grow by itself.
        false
    }
}
