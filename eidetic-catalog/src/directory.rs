//! Catalog over a persisted list of tracked directories.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{CatalogError, Result};

/// Name of the tracked-directory list file inside the data root.
const DIRECTORY_LIST_FILE: &str = "directory_list.json";

/// File extensions eligible for tracking.
const EXTENSION_WHITELIST: &[&str] = &["md", "txt"];

/// A [`Catalog`] backed by a list of tracked directories.
///
/// The list persists as JSON under the data root and survives restarts.
/// Each tracked directory is listed non-recursively; only files whose
/// extension is in the whitelist (`md`, `txt`) are part of the corpus.
pub struct DirectoryCatalog {
    data_dir: PathBuf,
    directories: RwLock<Vec<PathBuf>>,
}

impl DirectoryCatalog {
    /// Open the catalog rooted at `data_dir`, creating the directory and
    /// reading the persisted tracked-directory list if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the data directory cannot be
    /// created or the list file cannot be read, and
    /// [`CatalogError::Parse`] if the list file does not parse.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| CatalogError::Io { path: data_dir.clone(), source: e })?;

        let list_path = data_dir.join(DIRECTORY_LIST_FILE);
        let directories: Vec<PathBuf> = match tokio::fs::read(&list_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CatalogError::Parse { path: list_path.clone(), source: e })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(CatalogError::Io { path: list_path, source: e }),
        };

        debug!(
            data_dir = %data_dir.display(),
            tracked = directories.len(),
            "opened directory catalog"
        );
        Ok(Self { data_dir, directories: RwLock::new(directories) })
    }

    /// Track a directory, persisting the updated list.
    ///
    /// Returns `false` if the directory was already tracked.
    pub async fn add_directory(&self, dir: impl AsRef<Path>) -> Result<bool> {
        let dir = dir.as_ref().to_path_buf();
        let mut directories = self.directories.write().await;
        if directories.contains(&dir) {
            return Ok(false);
        }
        directories.push(dir.clone());
        if let Err(e) = self.persist(&directories).await {
            directories.pop();
            return Err(e);
        }
        debug!(dir = %dir.display(), "tracking directory");
        Ok(true)
    }

    /// Snapshot of the tracked directories.
    pub async fn directories(&self) -> Vec<PathBuf> {
        self.directories.read().await.clone()
    }

    async fn persist(&self, directories: &[PathBuf]) -> Result<()> {
        let list_path = self.data_dir.join(DIRECTORY_LIST_FILE);
        let json = serde_json::to_vec_pretty(directories)
            .map_err(|e| CatalogError::Parse { path: list_path.clone(), source: e })?;
        tokio::fs::write(&list_path, json)
            .await
            .map_err(|e| CatalogError::Io { path: list_path, source: e })
    }
}

/// List the whitelisted files directly inside `dir`, sorted by path.
fn list_directory(dir: &Path) -> Vec<CatalogEntry> {
    let mut entries = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSION_WHITELIST.contains(&ext))
        })
        .map(|entry| CatalogEntry::from_path(entry.into_path()))
        .collect::<Vec<_>>();

    entries.sort_by(|a, b| a.filepath.cmp(&b.filepath));
    entries
}

#[async_trait]
impl Catalog for DirectoryCatalog {
    async fn all_files(&self) -> Result<Vec<CatalogEntry>> {
        let directories = self.directories.read().await.clone();
        let mut files = Vec::new();
        for dir in &directories {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "tracked directory is missing, skipping");
                continue;
            }
            files.extend(list_directory(dir));
        }
        Ok(files)
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Io { path: path.to_path_buf(), source: e })
    }
}
