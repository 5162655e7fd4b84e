//! Identity and metadata extraction for comic archives.
//!
//! Nothing in this crate touches the filesystem. Callers hand over the first
//! bytes of an archive (see [`FINGERPRINT_SIZE`]) and its path, and receive a
//! [`Book`] describing it:
//!
//! - [`fingerprint`] derives the content-addressed [`BookId`] used as the key
//!   of both the catalog and the page cache.
//! - [`Tags::parse`] derives categories and artists from the filename and the
//!   name of the directory containing the archive.

pub mod error;
mod fingerprint;
mod metadata;
pub mod models;

pub use crate::fingerprint::{FINGERPRINT_SIZE, fingerprint};
pub use crate::metadata::Tags;
pub use crate::models::{Book, BookId};
