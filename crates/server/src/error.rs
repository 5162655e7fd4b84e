//! Server Error Types

use derive_more::{Display, Error};
use std::net::SocketAddr;

/// A server error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failed to listen on {_0}")]
    Bind(#[error(not(source))] SocketAddr),
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bind(_))
    }
}
