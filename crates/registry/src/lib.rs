//! Persistent catalog of every distinct book found in the library.
//!
//! Books are keyed by their content fingerprint and stored as serialized
//! records in SQLite. The catalog is append-only: the first registration of an
//! identifier wins and records are never updated or removed. Deleting the
//! database is harmless, a scan of the library rebuilds it.

mod db;
pub mod error;
mod models;
mod registry;

pub use crate::db::Database;
pub use crate::registry::{Registration, Registry};
