use std::path::PathBuf;
use time::OffsetDateTime;

/// A regular file discovered under the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from the library root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// Final path component, lossily converted to UTF-8.
    pub fn name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Whether the file name starts with a dot.
    pub fn is_hidden(&self) -> bool {
        self.name().starts_with('.')
    }

    /// Lowercased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}
