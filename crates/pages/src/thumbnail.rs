use exn::ResultExt;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::path::Path;

use crate::error::{ErrorKind, Result};

pub const THUMBNAIL_FILENAME: &str = "thumbnail.jpg";
pub const THUMBNAIL_WIDTH: u32 = 364;
pub const THUMBNAIL_HEIGHT: u32 = 514;

/// Render `source` as a cover-sized JPEG at `target`, unless one exists.
///
/// The image is scaled to cover the whole thumbnail and the overflow is
/// cropped evenly on both sides. Written through a temporary file so a
/// half-written thumbnail is never served.
pub(crate) fn generate(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        return Ok(());
    }
    let image = decode(source)?;
    let thumbnail = image.resize_to_fill(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Lanczos3);
    let partial = target.with_extension("jpg.partial");
    // JPEG has no alpha channel.
    thumbnail
        .to_rgb8()
        .save_with_format(&partial, ImageFormat::Jpeg)
        .or_raise(|| ErrorKind::Image(target.to_path_buf()))?;
    fs::rename(&partial, target).map_err(ErrorKind::Io)?;
    Ok(())
}

/// The format is sniffed from the content, never the extension.
fn decode(source: &Path) -> Result<DynamicImage> {
    let invalid = || ErrorKind::Image(source.to_path_buf());
    let reader = ImageReader::open(source).or_raise(invalid)?.with_guessed_format().or_raise(invalid)?;
    reader.decode().or_raise(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_generate_fills_thumbnail() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("0.png");
        RgbImage::from_fn(800, 600, |x, _| Rgb([(x % 256) as u8, 0, 0])).save(&source).unwrap();
        let target = temp_dir.path().join(THUMBNAIL_FILENAME);
        generate(&source, &target).unwrap();
        let thumbnail = image::open(&target).unwrap();
        assert_eq!(thumbnail.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
        assert!(!temp_dir.path().join("thumbnail.jpg.partial").exists());
    }

    #[test]
    fn test_content_wins_over_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("0.jpg");
        RgbImage::from_pixel(100, 100, Rgb([0, 128, 255])).save_with_format(&source, ImageFormat::Png).unwrap();
        let target = temp_dir.path().join(THUMBNAIL_FILENAME);
        generate(&source, &target).unwrap();
        assert_eq!(image::open(&target).unwrap().dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
    }

    #[test]
    fn test_existing_thumbnail_is_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join(THUMBNAIL_FILENAME);
        fs::write(&target, b"already here").unwrap();
        // The source doesn't even need to exist.
        generate(&temp_dir.path().join("missing.png"), &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"already here");
    }

    #[test]
    fn test_undecodable_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("0.jpg");
        fs::write(&source, b"not an image").unwrap();
        let err = generate(&source, &temp_dir.path().join(THUMBNAIL_FILENAME)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Image(_)));
    }
}
