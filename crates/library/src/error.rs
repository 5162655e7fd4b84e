//! Library Error Types

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A file, or the walk itself, couldn't be scanned. The error tree says
    /// which.
    #[display("scan failed")]
    Scan,
    /// The scan was stopped before visiting every file.
    #[display("scan canceled")]
    Canceled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
