use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::metadata::Tags;
use crate::models::BookId;

/// One catalog entry, representing a distinct archive.
///
/// When serialized, field names match the catalog format that readers
/// already consume (`ID`, `Filename`, `Artists`, `Categories`, `ModTime`).
/// The source [`path`](Self::path) is only meaningful during ingestion and
/// is never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "PascalCase"))]
pub struct Book {
    #[cfg_attr(feature = "serde", serde(rename = "ID"))]
    pub id: BookId,
    pub filename: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub path: PathBuf,
    #[cfg_attr(feature = "serde", serde(default))]
    pub artists: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub categories: Vec<String>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub mod_time: OffsetDateTime,
}
impl Book {
    /// Describe the archive at `path`, deriving its tags from the filename and
    /// the name of the directory that contains it.
    pub fn new(id: BookId, path: impl Into<PathBuf>, mod_time: OffsetDateTime) -> Self {
        let path = path.into();
        let filename = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        let Tags { categories, artists } = Tags::parse(&filename, parent_name(&path).as_deref());
        Self { id, filename, path, artists, categories, mod_time }
    }
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()?.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> BookId {
        "0123456789abcdef".parse().unwrap()
    }

    #[test]
    fn test_new_parses_filename_and_directory() {
        let book = Book::new(id(), "/library/SomeArtist/(C94) [hoge (group)] comics.zip", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(book.filename, "(C94) [hoge (group)] comics.zip");
        assert_eq!(book.categories, vec!["C94"]);
        assert_eq!(book.artists, vec!["hoge", "group", "SomeArtist"]);
    }

    #[test]
    fn test_new_without_parent() {
        let book = Book::new(id(), "comics.zip", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(book.filename, "comics.zip");
        assert!(book.artists.is_empty());
        assert!(book.categories.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialized_field_names() {
        let book = Book::new(id(), "/library/temp/[hoge] comics.zip", OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ID": "0123456789abcdef",
                "Filename": "[hoge] comics.zip",
                "Artists": ["hoge"],
                "Categories": [],
                "ModTime": "1970-01-01T00:00:00Z",
            })
        );
        let decoded: Book = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.id, book.id);
        assert_eq!(decoded.path, PathBuf::new());
    }
}
