pub mod error;
mod file;
mod stream;

pub use self::file::{Scan, is_candidate, scan_file};
pub use self::stream::{ScanEvent, scan};

/// Which files a scan picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Skip dot-directories and dot-files.
    pub skip_hidden: bool,
    /// Accepted extensions, without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
}
impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            extensions: ["zip", "cbz", "cbr"].map(String::from).to_vec(),
        }
    }
}
