use exn::{OptionExt, ResultExt};
use shelf_extract::Book;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{error, info, instrument};

use crate::error::{ErrorKind, Result};
use crate::lock::KeyedLock;
use crate::manifest::{INDEX_FILENAME, Manifest};
use crate::{extract, thumbnail};

/// Outcome of [`PageCache::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Pages were extracted by this call.
    Extracted(Manifest),
    /// The cache directory already existed; nothing was touched.
    AlreadyCached,
}

/// Owner of the page cache tree.
///
/// Cheap to clone, clones share the per-book locks.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
    locks: KeyedLock,
}
impl PageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: KeyedLock::default() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<first two characters of the id>/<id>`
    pub fn dir(&self, book: &Book) -> PathBuf {
        self.root.join(book.id.shard()).join(book.id.as_str())
    }

    pub fn index_path(&self, book: &Book) -> PathBuf {
        self.dir(book).join(INDEX_FILENAME)
    }

    fn staging_dir(&self, book: &Book) -> PathBuf {
        self.root.join(book.id.shard()).join(format!(".{}.partial", book.id))
    }

    /// Manifest of a book, or `None` if its pages were never extracted.
    #[instrument(skip_all, fields(id = %book.id))]
    pub async fn get(&self, book: &Book) -> Result<Option<Manifest>> {
        let _guard = self.locks.lock(&book.id).await;
        let dir = self.dir(book);
        if !tokio::fs::try_exists(&dir).await.map_err(ErrorKind::Io)? {
            return Ok(None);
        }
        let index = self.index_path(book);
        let data = tokio::fs::read(&index).await.map_err(ErrorKind::Io)?;
        let manifest = serde_json::from_slice(&data).or_raise(|| ErrorKind::InvalidManifest(index))?;
        Ok(Some(manifest))
    }

    /// Extract the pages of the archive at `source` for `book`.
    ///
    /// Does nothing when the book's directory already exists, whatever its
    /// contents. Entries that fail to extract are logged and left out of the
    /// manifest; an archive that can't be opened at all is an
    /// [`Archive`](ErrorKind::Archive) error and leaves no directory behind.
    #[instrument(skip_all, fields(id = %book.id, source = %source.as_ref().display()))]
    pub async fn generate(&self, source: impl AsRef<Path>, book: &Book) -> Result<GenerateOutcome> {
        let _guard = self.locks.lock(&book.id).await;
        let target = self.dir(book);
        if tokio::fs::try_exists(&target).await.map_err(ErrorKind::Io)? {
            return Ok(GenerateOutcome::AlreadyCached);
        }
        let source = source.as_ref().to_path_buf();
        let staging = self.staging_dir(book);
        let result = spawn_blocking(move || extract::extract(&source, &staging, &target))
            .await
            .or_raise(|| ErrorKind::Task)
            .and_then(|result| result);
        match result {
            Ok(manifest) => {
                info!(pages = manifest.filenames.len(), "extracted pages");
                Ok(GenerateOutcome::Extracted(manifest))
            },
            Err(err) => {
                error!(error = %*err, "failed to extract pages");
                Err(err)
            },
        }
    }

    /// Path of a file inside the book's cache directory.
    ///
    /// `filename` must be a plain name (no separators, no `..`); whether the
    /// file exists isn't checked.
    pub fn resolve(&self, book: &Book, filename: &str) -> Result<PathBuf> {
        let name = shelf_storage::validate_name(filename).or_raise(|| ErrorKind::InvalidPath(filename.to_string()))?;
        Ok(self.dir(book).join(name))
    }

    /// Path of the book's thumbnail, rendering it from the cover first if
    /// needed.
    ///
    /// # Errors
    /// [`NotGenerated`](ErrorKind::NotGenerated) if the pages were never
    /// extracted, [`Empty`](ErrorKind::Empty) if there's no cover to render.
    #[instrument(skip_all, fields(id = %book.id))]
    pub async fn thumbnail(&self, book: &Book) -> Result<PathBuf> {
        let manifest = self.get(book).await?.ok_or_raise(|| ErrorKind::NotGenerated(book.id.to_string()))?;
        let cover = manifest.cover().ok_or_raise(|| ErrorKind::Empty(book.id.to_string()))?;
        let source = self.resolve(book, cover)?;
        let target = self.dir(book).join(thumbnail::THUMBNAIL_FILENAME);
        let _guard = self.locks.lock(&book.id).await;
        let path = target.clone();
        spawn_blocking(move || thumbnail::generate(&source, &path))
            .await
            .or_raise(|| ErrorKind::Task)??;
        Ok(target)
    }
}
