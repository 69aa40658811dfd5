//! Manifest row model.

use serde::{Deserialize, Serialize};

/// One line of a folder's URL manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// File name with the extension stripped.
    pub name: String,
    /// Empty column reserved for manual annotation downstream.
    pub placeholder: String,
    /// Public CDN URL of the file.
    pub url: String,
}

impl ManifestRow {
    /// Create a row with an empty placeholder column.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placeholder: String::new(),
            url: url.into(),
        }
    }

    /// Row cells in column order.
    pub fn cells(&self) -> [&str; 3] {
        [&self.name, &self.placeholder, &self.url]
    }
}
