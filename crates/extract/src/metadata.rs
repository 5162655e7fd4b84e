//! Filename metadata grammar.
//!
//! Archive names follow an informal convention:
//!
//! ```text
//! (category) [group (artist)] title [ignored].zip
//! ```
//!
//! Every part is optional. The leading parenthetical is usually an event or
//! convention code, the bracketed part names a circle and (optionally) the
//! individual artist inside it. Everything after the bracketed part is the
//! title and isn't parsed. A malformed name yields fewer tags, never an error.

use tracing::instrument;

/// Tags derived from an archive's filename and its containing directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    /// At most one entry, from the leading parenthesized token.
    pub categories: Vec<String>,
    /// Group then individual artist from the leading bracketed token,
    /// followed by the directory name when it looks like an artist folder.
    pub artists: Vec<String>,
}
impl Tags {
    /// Parse tags from a filename and, optionally, the name of the directory
    /// the file lives in.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf_extract::Tags;
    /// let tags = Tags::parse("(C94) [hoge (fuga)] comics.zip", Some("piyo"));
    /// assert_eq!(tags.categories, vec!["C94"]);
    /// assert_eq!(tags.artists, vec!["hoge", "fuga", "piyo"]);
    /// ```
    #[instrument(level = "trace")]
    pub fn parse(filename: &str, directory: Option<&str>) -> Self {
        let tags = Self::from_filename(filename);
        match directory {
            Some(directory) => tags.with_directory(directory),
            None => tags,
        }
    }

    /// Parse the leading `(category)` and `[artists]` tokens of a filename.
    pub fn from_filename(filename: &str) -> Self {
        let mut tags = Self::default();
        let mut rest = filename;
        if let Some((category, after)) = leading_category(rest) {
            tags.categories.push(category.to_string());
            rest = after;
        }
        if let Some((raw_artists, _title)) = leading_artists(rest.trim_start_matches(is_space)) {
            tags.artists = split_artists(raw_artists);
        }
        tags
    }

    /// Append the containing directory as an artist, unless it's obviously
    /// not an artist folder (dotted names, `temp`, purely numeric names) or
    /// the artist is already known.
    pub fn with_directory(mut self, directory: &str) -> Self {
        if is_artist_directory(directory) && !self.artists.iter().any(|artist| artist == directory) {
            self.artists.push(directory.to_string());
        }
        self
    }
}

/// Whitespace as understood by the naming convention (ASCII only).
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// Matches `(category)` at the very start of `s`.
///
/// The category can't contain whitespace but can contain `)`: the last `)`
/// of the run is the closing one. A token is only a category when something
/// follows it, otherwise the whole name is the title.
fn leading_category(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('(')?;
    let run = &inner[..inner.find(is_space).unwrap_or(inner.len())];
    run.rmatch_indices(')')
        .map(|(close, _)| (&run[..close], &inner[close + 1..]))
        .find(|(category, after)| !category.is_empty() && !after.is_empty())
}

/// Matches `[raw artists]` at the very start of `s`.
fn leading_artists(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('[')?;
    let close = inner.find(']')?;
    let (raw, after) = (&inner[..close], &inner[close + 1..]);
    (!raw.is_empty() && !after.is_empty()).then_some((raw, after))
}

/// Splits `group (artist)` into its trimmed, non-empty parts.
fn split_artists(raw: &str) -> Vec<String> {
    let Some(start) = raw.find(|c: char| c != '(') else {
        return Vec::new();
    };
    let raw = &raw[start..];
    let (group, rest) = raw.split_at(raw.find('(').unwrap_or(raw.len()));
    let individual = rest.strip_prefix('(').and_then(|inner| match inner.rfind(')') {
        Some(close) if close > 0 => Some(&inner[..close]),
        _ => None,
    });
    [Some(group), individual].into_iter().flatten().map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

fn is_artist_directory(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['.', '/'])
        && name != "temp"
        && !name.bytes().all(|b| b.is_ascii_digit())
}
