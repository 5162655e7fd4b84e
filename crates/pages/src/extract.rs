//! Blocking extraction of an archive into a cache directory.

use exn::ResultExt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{ErrorKind, Result};
use crate::manifest::{INDEX_FILENAME, Manifest};

const PAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Lowercased extension (with the dot) of an archive entry, if it's a page.
///
/// Only the last component of the entry name counts, and a name made only of
/// an extension (`.png`) is still a page.
pub(crate) fn page_extension(entry_name: &str) -> Option<String> {
    let base = entry_name.rsplit('/').next().unwrap_or(entry_name);
    let extension = base[base.rfind('.')?..].to_ascii_lowercase();
    PAGE_EXTENSIONS.contains(&extension.as_str()).then_some(extension)
}

/// Extract every page of `source` into `target`, going through `staging`.
///
/// `staging` is wiped first in case an earlier attempt died halfway, and is
/// removed again if anything goes wrong, so `target` either doesn't exist or
/// holds a complete manifest.
pub(crate) fn extract(source: &Path, staging: &Path, target: &Path) -> Result<Manifest> {
    if staging.exists() {
        warn!(path = %staging.display(), "removing stale staging directory");
        fs::remove_dir_all(staging).map_err(ErrorKind::Io)?;
    }
    fs::create_dir_all(staging).map_err(ErrorKind::Io)?;
    let result = extract_pages(source, staging).and_then(|manifest| {
        write_manifest(&staging.join(INDEX_FILENAME), &manifest)?;
        fs::rename(staging, target).map_err(ErrorKind::Io)?;
        Ok(manifest)
    });
    if result.is_err()
        && let Err(err) = fs::remove_dir_all(staging)
    {
        warn!(path = %staging.display(), error = %err, "failed to clean up staging directory");
    }
    result
}

fn extract_pages(source: &Path, dir: &Path) -> Result<Manifest> {
    let file = File::open(source).map_err(ErrorKind::Io)?;
    let mut archive = ZipArchive::new(file).or_raise(|| ErrorKind::Archive(source.to_path_buf()))?;
    let mut manifest = Manifest::default();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable archive entry");
                continue;
            },
        };
        if entry.is_dir() {
            continue;
        }
        let Some(extension) = page_extension(entry.name()) else {
            debug!(name = entry.name(), "skipping non-image entry");
            continue;
        };
        let filename = format!("{index}{extension}");
        let path = dir.join(&filename);
        if let Err(err) = write_entry(&mut entry, &path) {
            warn!(name = entry.name(), target = %path.display(), error = %err, "failed to extract page");
            _ = fs::remove_file(&path);
            continue;
        }
        manifest.filenames.push(filename);
    }
    Ok(manifest)
}

fn write_entry(entry: &mut impl io::Read, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    io::copy(entry, &mut writer)?;
    writer.flush()
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let data = serde_json::to_vec(manifest).or_raise(|| ErrorKind::InvalidManifest(path.to_path_buf()))?;
    fs::write(path, data).map_err(ErrorKind::Io)?;
    Ok(())
}
