//! Page Cache Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A page cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for page cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The source file couldn't be opened as a zip container.
    #[display("unreadable archive: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    #[display("invalid manifest: {}", _0.display())]
    InvalidManifest(#[error(not(source))] PathBuf),
    /// Requested filename isn't a plain name inside the cache directory.
    #[display("invalid filename: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// Pages for this book haven't been extracted.
    #[display("pages not generated for book {_0}")]
    NotGenerated(#[error(not(source))] String),
    /// The archive contained no pages.
    #[display("no pages in book {_0}")]
    Empty(#[error(not(source))] String),
    #[display("image processing failed: {}", _0.display())]
    Image(#[error(not(source))] PathBuf),
    /// A blocking task panicked or was cancelled.
    #[display("background task failed")]
    Task,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Task)
    }

    /// Returns `true` if the error means "there's nothing there".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotGenerated(_) | Self::Empty(_) | Self::InvalidPath(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
