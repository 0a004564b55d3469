use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One file tracked for search.
///
/// Identity is the `filepath`; `filename` is the final path component,
/// kept alongside for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Path to the file on disk.
    pub filepath: PathBuf,
    /// The file's base name.
    pub filename: String,
}

impl CatalogEntry {
    /// Build an entry from a path, deriving the display name from its
    /// final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let filepath = path.into();
        let filename = filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { filepath, filename }
    }
}

/// Source of corpus files and their contents.
///
/// Implementations decide which files are tracked; the search engine only
/// ever consumes this interface.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List every tracked file.
    async fn all_files(&self) -> Result<Vec<CatalogEntry>>;

    /// Read a tracked file's contents as UTF-8 text.
    ///
    /// A file that cannot be read is an error, never empty content.
    async fn read_file(&self, path: &Path) -> Result<String>;
}
