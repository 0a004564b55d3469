//! Persistent embedding records and the loaded-record list.
//!
//! One JSON record per source file lives under `<data_dir>/embeddings/`,
//! named after the content-derived base key. [`EmbeddingStore`] owns
//! that directory plus the list of record paths currently loaded for
//! ranking. The list is only ever updated wholesale: `build` appends
//! its stored paths in one step after the fan-out completes, `load`
//! replaces the list, so a concurrent reader sees either the old or the
//! new complete list.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{debug, info, warn};

use eidetic_catalog::{Catalog, CatalogEntry};

use crate::config::IndexConfig;
use crate::embedder::Embedder;
use crate::error::{IndexError, Result};
use crate::record::{EmbeddingRecord, base_key, record_filename};

/// Subdirectory of the data directory holding record files.
const STORAGE_SUBDIR: &str = "embeddings";

/// One file that could not be built during a [`EmbeddingStore::build`].
#[derive(Debug)]
pub struct BuildFailure {
    /// The source file whose record could not be built.
    pub source_path: PathBuf,
    /// Why the build step failed for this file.
    pub error: IndexError,
}

/// Result of a build fan-out: every input file is accounted for either
/// in `stored` or in `failures`.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// Storage paths of the records written by this call.
    pub stored: Vec<PathBuf>,
    /// Files that failed, with the reason each one failed.
    pub failures: Vec<BuildFailure>,
}

impl BuildOutcome {
    /// True when every requested file produced a record.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the on-disk record directory and the loaded-record list.
pub struct EmbeddingStore {
    catalog: Arc<dyn Catalog>,
    embedder: Arc<dyn Embedder>,
    storage_dir: PathBuf,
    max_concurrency: usize,
    loaded: RwLock<Vec<PathBuf>>,
}

impl EmbeddingStore {
    /// Create a store rooted under the configured data directory.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        embedder: Arc<dyn Embedder>,
        config: &IndexConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            storage_dir: config.data_dir.join(STORAGE_SUBDIR),
            max_concurrency: config.max_concurrency,
            loaded: RwLock::new(Vec::new()),
        }
    }

    /// Directory holding the record files.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub(crate) fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Snapshot of the record paths currently loaded for ranking.
    pub async fn loaded(&self) -> Vec<PathBuf> {
        self.loaded.read().await.clone()
    }

    /// Read and parse one record file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be read and
    /// [`IndexError::MalformedRecord`] if it is not a valid record.
    pub async fn read_record(&self, path: &Path) -> Result<EmbeddingRecord> {
        let bytes = fs::read(path)
            .await
            .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_slice(&bytes).map_err(|e| IndexError::MalformedRecord {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build and persist one record per input file, fanning out under
    /// the configured concurrency limit.
    ///
    /// A failing file never aborts its siblings; the outcome lists the
    /// stored paths and every per-file failure. All stored paths are
    /// appended to the loaded list in one step once the fan-out is done.
    ///
    /// # Errors
    ///
    /// Returns an error only when the storage directory itself cannot
    /// be prepared or listed. Per-file failures are reported in the
    /// returned [`BuildOutcome`].
    pub async fn build(&self, files: &[CatalogEntry]) -> Result<BuildOutcome> {
        self.ensure_storage_dir().await?;
        // Seeding with the on-disk names makes collision suffixes
        // unique across calls, not just within this one.
        let taken: Mutex<HashSet<String>> =
            Mutex::new(self.existing_filenames().await?.into_iter().collect());
        let semaphore = Semaphore::new(self.max_concurrency);

        let jobs = files.iter().map(|entry| {
            let taken = &taken;
            let semaphore = &semaphore;
            async move {
                let result = async {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        IndexError::Config("build concurrency limiter closed".into())
                    })?;
                    self.build_one(entry, taken).await
                }
                .await;
                (entry.filepath.clone(), result)
            }
        });
        let results = futures::future::join_all(jobs).await;

        let mut outcome = BuildOutcome::default();
        for (source_path, result) in results {
            match result {
                Ok(path) => outcome.stored.push(path),
                Err(error) => {
                    warn!(
                        path = %source_path.display(),
                        error = %error,
                        "failed to build embedding record"
                    );
                    outcome.failures.push(BuildFailure { source_path, error });
                }
            }
        }
        self.loaded.write().await.extend(outcome.stored.iter().cloned());
        info!(
            stored = outcome.stored.len(),
            failed = outcome.failures.len(),
            "build finished"
        );
        Ok(outcome)
    }

    async fn build_one(
        &self,
        entry: &CatalogEntry,
        taken: &Mutex<HashSet<String>>,
    ) -> Result<PathBuf> {
        let contents = self.catalog.read_file(&entry.filepath).await?;
        let embedding = self.embedder.embed(&contents).await?;
        embedding.ensure_well_formed()?;

        let key = base_key(&contents);
        let filename = {
            let mut taken = taken.lock().await;
            let mut suffix = 0;
            loop {
                let candidate = record_filename(&key, suffix);
                if !taken.contains(&candidate) {
                    taken.insert(candidate.clone());
                    break candidate;
                }
                suffix += 1;
            }
        };

        let path = self.storage_dir.join(&filename);
        let record = EmbeddingRecord {
            storage_path: path.clone(),
            source_path: entry.filepath.clone(),
            embedding,
        };
        write_record(&path, &record).await?;
        debug!(
            source = %entry.filepath.display(),
            record = %path.display(),
            "stored embedding record"
        );
        Ok(path)
    }

    /// Reconcile the loaded list against the catalog: for every corpus
    /// file, adopt each on-disk record whose filename contains the
    /// file's content key. Replaces the previous list wholesale.
    ///
    /// Files that cannot be read are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or the storage directory
    /// cannot be listed.
    pub async fn load(&self) -> Result<usize> {
        self.ensure_storage_dir().await?;
        let entries = self.catalog.all_files().await?;
        let existing = self.existing_filenames().await?;

        let mut matched = Vec::new();
        let mut seen = HashSet::new();
        for entry in &entries {
            let contents = match self.catalog.read_file(&entry.filepath).await {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(
                        path = %entry.filepath.display(),
                        error = %e,
                        "skipping unreadable file"
                    );
                    continue;
                }
            };
            let key = base_key(&contents);
            for name in existing.iter().filter(|name| name.contains(&key)) {
                let path = self.storage_dir.join(name);
                if seen.insert(path.clone()) {
                    matched.push(path);
                }
            }
        }

        let count = matched.len();
        *self.loaded.write().await = matched;
        info!(records = count, "loaded embedding records");
        Ok(count)
    }

    /// Sweep the storage directory, deleting records whose source file
    /// is gone from the catalog, records superseded by a newer build of
    /// the same source, unparsable records, and stale temp files.
    /// Returns how many files were removed.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or storage directory cannot be
    /// listed, or a record file cannot be read or deleted.
    pub async fn clean(&self) -> Result<usize> {
        self.ensure_storage_dir().await?;
        let sources: HashSet<PathBuf> = self
            .catalog
            .all_files()
            .await?
            .into_iter()
            .map(|entry| entry.filepath)
            .collect();

        let mut removed = Vec::new();
        let mut by_source: HashMap<PathBuf, Vec<(SystemTime, PathBuf)>> = HashMap::new();
        for name in self.all_filenames().await? {
            let path = self.storage_dir.join(&name);
            if name.ends_with(".json.tmp") {
                self.remove(&path, &mut removed, "stale temp file").await?;
                continue;
            }
            if !name.ends_with(".json") {
                continue;
            }
            let record = match self.read_record(&path).await {
                Ok(record) => record,
                Err(IndexError::MalformedRecord { .. }) => {
                    self.remove(&path, &mut removed, "unparsable record").await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !sources.contains(&record.source_path) {
                self.remove(&path, &mut removed, "source missing from catalog").await?;
                continue;
            }
            let modified = fs::metadata(&path)
                .await
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            by_source.entry(record.source_path).or_default().push((modified, path));
        }

        for (_, mut records) in by_source {
            records.sort();
            // The newest record for this source survives.
            records.pop();
            for (_, path) in records {
                self.remove(&path, &mut removed, "superseded by a newer record").await?;
            }
        }

        if !removed.is_empty() {
            let removed_set: HashSet<&PathBuf> = removed.iter().collect();
            self.loaded.write().await.retain(|path| !removed_set.contains(path));
        }
        info!(removed = removed.len(), "clean finished");
        Ok(removed.len())
    }

    async fn remove(&self, path: &Path, removed: &mut Vec<PathBuf>, reason: &str) -> Result<()> {
        fs::remove_file(path)
            .await
            .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), reason, "removed record file");
        removed.push(path.to_path_buf());
        Ok(())
    }

    async fn ensure_storage_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|source| IndexError::Io { path: self.storage_dir.clone(), source })
    }

    /// Record filenames currently on disk, sorted.
    async fn existing_filenames(&self) -> Result<Vec<String>> {
        Ok(self
            .all_filenames()
            .await?
            .into_iter()
            .filter(|name| name.ends_with(".json"))
            .collect())
    }

    async fn all_filenames(&self) -> Result<Vec<String>> {
        let mut dir = fs::read_dir(&self.storage_dir)
            .await
            .map_err(|source| IndexError::Io { path: self.storage_dir.clone(), source })?;
        let mut names = Vec::new();
        while let Some(dirent) = dir
            .next_entry()
            .await
            .map_err(|source| IndexError::Io { path: self.storage_dir.clone(), source })?
        {
            let file_type = dirent
                .file_type()
                .await
                .map_err(|source| IndexError::Io { path: dirent.path(), source })?;
            if file_type.is_file() {
                names.push(dirent.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Write a record atomically: temp file, flush to disk, rename into
/// place. A crash or cancellation mid-write leaves only a temp file,
/// never a torn record.
async fn write_record(path: &Path, record: &EmbeddingRecord) -> Result<()> {
    let bytes = serde_json::to_vec(record).map_err(|e| IndexError::MalformedRecord {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json.tmp");
    let written: std::io::Result<()> = async {
        let mut file = File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;
    written.map_err(|source| IndexError::Io { path: path.to_path_buf(), source })
}
