use sha1::{Digest, Sha1};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::BookId;

/// Number of leading bytes of a file that contribute to its [`BookId`].
pub const FINGERPRINT_SIZE: usize = 512;

/// Derives the content-addressed identifier of a file from its first bytes.
///
/// The identifier is the hex SHA-1 digest of a [`FINGERPRINT_SIZE`] buffer
/// holding the head of the file. Files shorter than that are zero-padded, so
/// identifiers stay compatible with catalogs and page caches that were built
/// by reading into a fixed, zeroed buffer. Anything past the first
/// [`FINGERPRINT_SIZE`] bytes of `head` is ignored.
///
/// Two archives that share their first 512 bytes but differ afterwards
/// receive the same identifier. That's an accepted limitation: reading only
/// the head keeps a scan of thousands of large archives cheap.
///
/// # Errors
/// Returns [`ErrorKind::Io`] (`UnexpectedEof`) when `head` is empty.
///
/// # Examples
///
/// ```
/// use shelf_extract::fingerprint;
/// let id = fingerprint(b"PK\x03\x04").unwrap();
/// assert_eq!(id.as_str().len(), 40);
/// assert_eq!(id, fingerprint(b"PK\x03\x04").unwrap());
/// ```
#[instrument(level = "trace", skip(head), fields(head_size = head.len()))]
pub fn fingerprint(head: &[u8]) -> Result<BookId> {
    if head.is_empty() {
        exn::bail!(ErrorKind::Io(IoError::new(IoErrorKind::UnexpectedEof, "cannot fingerprint an empty file")));
    }
    let mut buffer = [0u8; FINGERPRINT_SIZE];
    let len = head.len().min(FINGERPRINT_SIZE);
    buffer[..len].copy_from_slice(&head[..len]);
    Ok(BookId::from_digest(format!("{:x}", Sha1::digest(buffer))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let head = vec![7u8; FINGERPRINT_SIZE];
        assert_eq!(fingerprint(&head).unwrap(), fingerprint(&head).unwrap());
    }

    #[test]
    fn test_fingerprint_of_zeroed_buffer() {
        // SHA-1 of 512 zero bytes.
        let id = fingerprint(&[0u8; FINGERPRINT_SIZE]).unwrap();
        assert_eq!(id.as_str(), "5c3eb80066420002bc3dcc7ca4ab6efad7ed4ae5");
    }

    #[test]
    fn test_short_files_are_zero_padded() {
        let mut padded = vec![0u8; FINGERPRINT_SIZE];
        padded[..3].copy_from_slice(b"abc");
        assert_eq!(fingerprint(b"abc").unwrap(), fingerprint(&padded).unwrap());
    }

    #[test]
    fn test_only_the_head_counts() {
        let mut first = vec![1u8; FINGERPRINT_SIZE * 2];
        let mut second = first.clone();
        second[FINGERPRINT_SIZE + 10] = 2;
        assert_eq!(fingerprint(&first).unwrap(), fingerprint(&second).unwrap());
        first[0] = 0;
        assert_ne!(fingerprint(&first).unwrap(), fingerprint(&second).unwrap());
    }

    #[test]
    fn test_empty_head_is_an_io_error() {
        let err = fingerprint(&[]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(e) if e.kind() == IoErrorKind::UnexpectedEof));
    }
}
