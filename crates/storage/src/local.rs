//! Local filesystem access to the library root.
//!
//! The library is read-only from our point of view: files are discovered,
//! stat'ed and their heads read for fingerprinting, nothing is ever written.

use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};
use crate::{FileInfo, path::validate as validate_path};

pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Controls which parts of the tree [`LocalBackend::walk`] visits.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// Don't descend into directories whose name starts with a dot.
    pub skip_hidden: bool,
}
impl Default for WalkOptions {
    fn default() -> Self {
        Self { skip_hidden: true }
    }
}

/// Local filesystem library root.
///
/// All paths taken and returned are relative to the root directory.
///
/// # Examples
///
/// ```no_run
/// use shelf_storage::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("/srv/comics")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}
impl LocalBackend {
    /// Open an existing library directory.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or not a directory, and [`NotFound`](ErrorKind::NotFound) if
    /// it doesn't exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Synchronous on purpose: happens once, at startup.
        let metadata = std::fs::metadata(&root).map_err(|e| Self::map_io_error(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative library path to an absolute one.
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn relative_path(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute
            .strip_prefix(&self.root)
            .or_raise(|| ErrorKind::InvalidPath(absolute.to_path_buf()))?;
        validate_path(relative)
    }

    fn file_info(path: &Path, metadata: &Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(path, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Classify one directory entry. Inside the walk stream errors can't be
    /// `?`-propagated, so all the fallible work happens here instead.
    async fn process_entry(&self, entry: &DirEntry, options: WalkOptions) -> Result<WalkEntry> {
        let path = entry.path();
        let hidden = entry.file_name().as_encoded_bytes().starts_with(b".");
        let mut metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        if metadata.is_symlink() {
            // Follow links to files, but never into directories: no cycles.
            match fs::metadata(&path).await {
                Ok(target) if target.is_file() => metadata = target,
                _ => {
                    debug!(path = %path.display(), "skipping symlink");
                    return Ok(WalkEntry::Skip);
                },
            }
        }
        if metadata.is_dir() {
            if hidden && options.skip_hidden {
                return Ok(WalkEntry::Skip);
            }
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            let relative = self.relative_path(&path)?;
            return Ok(WalkEntry::File(Self::file_info(&relative, &metadata)?));
        }
        Ok(WalkEntry::Skip)
    }

    /// Depth-first walk of every regular file under the root.
    ///
    /// Within a directory, entries are visited in name order, files before
    /// subdirectories. Errors about a single entry or subdirectory are yielded
    /// and the walk carries on; only an unreadable root ends the stream early.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn walk(&self, options: WalkOptions) -> FileInfoStream<'_> {
        let mut stack = vec![self.root.clone()];
        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    },
                };
                let mut batch = Vec::new();
                'entries: loop {
                    match entries.next_entry().await {
                        Ok(Some(entry)) => batch.push(entry),
                        Ok(None) => break 'entries,
                        Err(e) => {
                            yield Err(exn::Exn::from(Self::map_io_error(e, &current)));
                            continue 'dirs;
                        },
                    }
                }
                batch.sort_by_key(DirEntry::file_name);
                let mut subdirs = Vec::new();
                for entry in &batch {
                    match self.process_entry(entry, options).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => subdirs.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    }
                }
                stack.extend(subdirs.into_iter().rev());
            }
        })
    }

    /// Read at most `bytes` bytes from the start of a file.
    pub async fn read_head(&self, path: &Path, bytes: usize) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        let file = fs::File::open(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut buffer = Vec::with_capacity(bytes);
        file.take(bytes as u64).read_to_end(&mut buffer).await.map_err(ErrorKind::Io)?;
        Ok(buffer)
    }
}
