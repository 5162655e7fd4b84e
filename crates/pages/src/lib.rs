//! Content-addressed cache of extracted pages.
//!
//! Each book gets a directory under the cache root, sharded by the first two
//! characters of its identifier:
//!
//! ```text
//! <root>/ab/abcdef…/index.json      manifest, {"filenames": [...]}
//! <root>/ab/abcdef…/0.jpg           pages, named after their archive index
//! <root>/ab/abcdef…/thumbnail.jpg   derived on first request
//! ```
//!
//! A directory only ever appears complete: extraction happens in a hidden
//! staging directory that is renamed into place once the manifest is written.

mod cache;
pub mod error;
mod extract;
mod lock;
mod manifest;
mod thumbnail;

pub use crate::cache::{GenerateOutcome, PageCache};
pub use crate::manifest::{INDEX_FILENAME, Manifest};
pub use crate::thumbnail::{THUMBNAIL_FILENAME, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
