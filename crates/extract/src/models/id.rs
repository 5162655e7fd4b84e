use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Content-addressed identifier of a book.
///
/// Always lowercase hexadecimal and at least two characters long, which is
/// what makes it safe to use as a path component and to shard on (see
/// [`shard`](Self::shard)). Identifiers are produced by
/// [`fingerprint`](crate::fingerprint) or parsed from untrusted input (URLs,
/// database rows) via [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(String);
impl BookId {
    /// Wraps a digest that is already known to be lowercase hex.
    pub(crate) fn from_digest(digest: String) -> Self {
        debug_assert!(Self::is_valid(&digest));
        Self(digest)
    }

    fn is_valid(s: &str) -> bool {
        s.len() >= 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first two characters, used to bound directory fan-out.
    pub fn shard(&self) -> &str {
        // Safety of the slice: ASCII only, and at least two bytes long.
        &self.0[..2]
    }
}

impl FromStr for BookId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            exn::bail!(ErrorKind::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl AsRef<str> for BookId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BookId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BookId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(|_| serde::de::Error::custom(format!("invalid book id: {raw:?}")))
    }
}
