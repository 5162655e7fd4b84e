pub mod error;
mod local;
mod models;
mod path;

pub use crate::local::{FileInfoStream, LocalBackend, WalkOptions};
pub use crate::models::FileInfo;
pub use crate::path::{validate as validate_path, validate_name};
