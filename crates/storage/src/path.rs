//! Path validation.
//!
//! Every path handed to [`LocalBackend`](crate::LocalBackend) is relative to
//! the library root, and every filename served out of a cache directory must
//! stay inside it. Both checks live here.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a relative library path and returns it normalized.
///
/// `.` components and repeated separators are dropped, `..` is resolved as
/// long as it never climbs above the root. Absolute paths are treated as
/// relative to the root. Null bytes and Windows prefixes are rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelf_storage::validate_path;
/// assert!(validate_path("Artist/(C94) [hoge] comics.zip").is_ok());
/// assert!(validate_path("Artist/../comics.zip").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert_eq!(validate_path("a/./b//c.zip/").unwrap(), Path::new("a/b/c.zip"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) if s.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(s) => components.push(s),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

/// Validates that `name` is exactly one plain path component.
///
/// Used for filenames coming from requests, which must resolve to a direct
/// child of a known directory: separators, `.`, `..` and null bytes are all
/// rejected rather than normalized.
///
/// ```
/// use shelf_storage::validate_name;
/// assert!(validate_name("0.jpg").is_ok());
/// assert!(validate_name("../index.json").is_err());
/// assert!(validate_name("a/b.jpg").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if s == name && !name.contains('\0') => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate("Artist/comics.zip").unwrap(), Path::new("Artist/comics.zip"));
        assert_eq!(validate("a/b/c/comics.cbz").unwrap(), Path::new("a/b/c/comics.cbz"));
        assert_eq!(validate("comics.zip").unwrap(), Path::new("comics.zip"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(validate("a//b//c").unwrap(), Path::new("a/b/c"));
        assert_eq!(validate("a/./b/./c").unwrap(), Path::new("a/b/c"));
        assert_eq!(validate("a/b/..").unwrap(), Path::new("a"));
        assert_eq!(validate("/a/b").unwrap(), Path::new("a/b"));
        assert_eq!(validate("Artist///").unwrap(), Path::new("Artist"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate("../etc/passwd").is_err());
        assert!(validate("a/../../b").is_err());
        assert!(validate("..").is_err());
    }

    #[test]
    fn test_rejected_paths() {
        let err = validate("a\0b").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(validate("").is_err());
        assert!(validate("./.").is_err());
        assert!(validate("//").is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_name("12.png").unwrap(), "12.png");
        assert_eq!(validate_name("thumbnail.jpg").unwrap(), "thumbnail.jpg");
        for name in ["", ".", "..", "../0.jpg", "a/0.jpg", "/0.jpg", "0.jpg/", "a\0b"] {
            assert!(validate_name(name).is_err(), "{name:?} should be rejected");
        }
    }
}
