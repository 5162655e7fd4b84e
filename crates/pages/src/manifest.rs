use serde::{Deserialize, Deserializer, Serialize};

/// Name of the manifest file inside a book's cache directory.
pub const INDEX_FILENAME: &str = "index.json";

/// List of extracted pages, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "nullable")]
    pub filenames: Vec<String>,
}
impl Manifest {
    /// First page, used as the cover.
    pub fn cover(&self) -> Option<&str> {
        self.filenames.first().map(String::as_str)
    }
}

// Older caches wrote `null` for archives without any pages.
fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
