//! Application Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("failed to prepare {}", _0.display())]
    Setup(#[error(not(source))] std::path::PathBuf),
    #[display("library unavailable")]
    Library,
    #[display("catalog unavailable")]
    Database,
    #[display("server error")]
    Server,
    #[display("scan failed")]
    Scan,
    #[display("scan canceled")]
    Canceled,
}
