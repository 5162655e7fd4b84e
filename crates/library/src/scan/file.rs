use exn::ResultExt;
use shelf_extract::{Book, FINGERPRINT_SIZE, fingerprint};
use shelf_pages::GenerateOutcome;
use shelf_registry::Registration;
use shelf_storage::FileInfo;
use tracing::instrument;

use crate::Context;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::scan::ScanOptions;
use crate::scan::error::{ErrorKind, Result as ScanResult};

/// The result of scanning a single archive.
#[derive(Debug)]
pub struct Scan {
    pub book: Book,
    /// Whether pages were extracted now or already cached.
    pub pages: GenerateOutcome,
    /// Whether the book is new to the catalog.
    pub registration: Registration,
}

/// Whether a discovered file should be scanned at all.
///
/// ```
/// use shelf_library::{ScanOptions, is_candidate};
/// use shelf_storage::FileInfo;
/// # let modified = std::time::SystemTime::UNIX_EPOCH.into();
/// let options = ScanOptions::default();
/// assert!(is_candidate(&FileInfo::new("Artist/comics.CBZ", 1, modified), &options));
/// assert!(!is_candidate(&FileInfo::new("Artist/.comics.zip", 1, modified), &options));
/// assert!(!is_candidate(&FileInfo::new("Artist/notes.txt", 1, modified), &options));
/// ```
pub fn is_candidate(file: &FileInfo, options: &ScanOptions) -> bool {
    if options.skip_hidden && file.is_hidden() {
        return false;
    }
    file.extension().is_some_and(|ext| options.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)))
}

/// Fingerprint an archive, extract its pages and register it.
///
/// Pages are extracted before the book is registered, so a book that shows
/// up in the catalog always has its pages on disk.
pub async fn scan_file(ctx: &Context, file: &FileInfo) -> LibraryResult<Scan> {
    scan_file_inner(ctx, file).await.or_raise(|| LibraryErrorKind::Scan)
}

#[instrument(level = "debug", skip_all, fields(path = %file.path.display()))]
pub(crate) async fn scan_file_inner(ctx: &Context, file: &FileInfo) -> ScanResult<Scan> {
    let head = ctx.backend.read_head(&file.path, FINGERPRINT_SIZE).await.or_raise(|| ErrorKind::Storage)?;
    let id = fingerprint(&head).or_raise(|| ErrorKind::Fingerprint)?;
    let path = ctx.backend.absolute_path(&file.path).or_raise(|| ErrorKind::Storage)?;
    let book = Book::new(id, &path, file.modified);
    let pages = ctx.pages.generate(&path, &book).await.or_raise(|| ErrorKind::Pages)?;
    let registration = ctx.registry.register(&book).await.or_raise(|| ErrorKind::Registry)?;
    Ok(Scan { book, pages, registration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::SystemTime;

    #[rstest]
    #[case::zip("comics.zip", true)]
    #[case::cbz("Artist/comics.cbz", true)]
    #[case::cbr("comics.cbr", true)]
    #[case::uppercase("COMICS.ZIP", true)]
    #[case::mixed_case("comics.CbZ", true)]
    #[case::hidden(".comics.zip", false)]
    #[case::resource_fork("Artist/._comics.zip", false)]
    #[case::other_extension("comics.rar", false)]
    #[case::extension_in_name("comics.zip.txt", false)]
    #[case::no_extension("zip", false)]
    fn test_default_candidates(#[case] path: &str, #[case] expected: bool) {
        let file = FileInfo::new(path, 1, SystemTime::UNIX_EPOCH.into());
        assert_eq!(is_candidate(&file, &ScanOptions::default()), expected);
    }

    #[test]
    fn test_custom_options() {
        let options = ScanOptions { skip_hidden: false, extensions: vec!["CBZ".to_string()] };
        let hidden = FileInfo::new(".comics.cbz", 1, SystemTime::UNIX_EPOCH.into());
        let zip = FileInfo::new("comics.zip", 1, SystemTime::UNIX_EPOCH.into());
        assert!(is_candidate(&hidden, &options));
        assert!(!is_candidate(&zip, &options));
    }
}
