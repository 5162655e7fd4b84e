//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a scan failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Walking the library or reading a file failed.
    #[display("storage error")]
    Storage,
    /// The file couldn't be fingerprinted (it's empty, most likely).
    #[display("fingerprint error")]
    Fingerprint,
    /// Extracting pages into the cache failed.
    #[display("page cache error")]
    Pages,
    /// Registering the book in the catalog failed.
    #[display("registry error")]
    Registry,
    /// The cancellation token was triggered.
    #[display("canceled")]
    Canceled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Registry)
    }
}
