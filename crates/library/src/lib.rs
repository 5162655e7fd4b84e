pub mod error;
pub mod scan;

use shelf_pages::PageCache;
use shelf_registry::Registry;
use shelf_storage::LocalBackend;

pub use crate::scan::{Scan, ScanEvent, ScanOptions, is_candidate, scan, scan_file};

/// Everything a scan reads from and writes to.
#[derive(Debug, Clone)]
pub struct Context {
    pub backend: LocalBackend,
    pub registry: Registry,
    pub pages: PageCache,
    pub options: ScanOptions,
}
