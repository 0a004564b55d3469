//! Search engine facade.
//!
//! [`SearchEngine`] is the single context object the shell constructs at
//! startup. It composes a [`Catalog`], an [`Embedder`], and the
//! [`EmbeddingStore`], and exposes the full operation surface: lexical
//! lookup, embedding build, startup load, similarity rank, and storage
//! clean.
//!
//! # Example
//!
//! ```rust,ignore
//! use eidetic_index::{IndexConfig, OpenAiEmbedder, SearchEngine};
//! use eidetic_catalog::DirectoryCatalog;
//!
//! let config = IndexConfig::default();
//! let catalog = Arc::new(DirectoryCatalog::open(&config.data_dir).await?);
//! let embedder = Arc::new(OpenAiEmbedder::from_env()?);
//!
//! let engine = SearchEngine::builder()
//!     .config(config)
//!     .catalog(catalog)
//!     .embedder(embedder)
//!     .build()?;
//!
//! engine.refresh_corpus().await?;
//! let hits = engine.lookup("lunch menu").await?;
//! ```

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use eidetic_catalog::{Catalog, CatalogEntry};

use crate::config::IndexConfig;
use crate::embedder::Embedder;
use crate::error::{IndexError, Result};
use crate::lexical::{ScanIndex, SearchHit};
use crate::rank::rank_loaded;
use crate::store::{BuildOutcome, EmbeddingStore};

/// The search engine context object.
///
/// Holds the catalog, the embedder, the record store, and a corpus
/// snapshot. Construct one via [`SearchEngine::builder()`].
pub struct SearchEngine {
    config: IndexConfig,
    catalog: Arc<dyn Catalog>,
    embedder: Arc<dyn Embedder>,
    store: EmbeddingStore,
    corpus: RwLock<Vec<CatalogEntry>>,
}

impl SearchEngine {
    /// Create a new [`SearchEngineBuilder`].
    pub fn builder() -> SearchEngineBuilder {
        SearchEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Return a reference to the catalog.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return a reference to the embedding record store.
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Re-pull the corpus snapshot from the catalog, replacing the
    /// previous snapshot wholesale. Returns the corpus size.
    ///
    /// Call at startup and after the tracked directories change.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Catalog`] when the catalog cannot be listed.
    pub async fn refresh_corpus(&self) -> Result<usize> {
        let files = self.catalog.all_files().await?;
        let count = files.len();
        *self.corpus.write().await = files;
        info!(files = count, "corpus refreshed");
        Ok(count)
    }

    /// Case-insensitive substring search over the corpus snapshot.
    ///
    /// # Errors
    ///
    /// Currently never fails; unreadable corpus files are skipped with
    /// a warning.
    pub async fn lookup(&self, query: &str) -> Result<Vec<SearchHit>> {
        let corpus = self.corpus.read().await.clone();
        ScanIndex::new(self.catalog.clone(), corpus).lookup(query).await
    }

    /// Build and persist embedding records for the given files.
    ///
    /// # Errors
    ///
    /// See [`EmbeddingStore::build`]; per-file failures are reported in
    /// the returned [`BuildOutcome`], not as an error.
    pub async fn build(&self, files: &[CatalogEntry]) -> Result<BuildOutcome> {
        self.store.build(files).await
    }

    /// Build embedding records for every file in the corpus snapshot.
    ///
    /// # Errors
    ///
    /// See [`SearchEngine::build`].
    pub async fn build_all(&self) -> Result<BuildOutcome> {
        let corpus = self.corpus.read().await.clone();
        self.store.build(&corpus).await
    }

    /// Reconcile the loaded-record list against the current catalog.
    /// Returns how many records are loaded afterwards.
    ///
    /// # Errors
    ///
    /// See [`EmbeddingStore::load`].
    pub async fn load(&self) -> Result<usize> {
        self.store.load().await
    }

    /// Rank the loaded records by similarity to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Service`] when the query cannot be
    /// embedded, [`IndexError::MalformedVector`] when the embedder
    /// produces an unusable query vector, and fails outright on any
    /// unreadable, unparsable, or dimension-mismatched record.
    pub async fn rank(&self, query: &str) -> Result<Vec<CatalogEntry>> {
        rank_loaded(&self.store, query).await
    }

    /// Sweep the record storage, removing records for vanished sources,
    /// superseded records, and unparsable files. Returns the number of
    /// files removed.
    ///
    /// # Errors
    ///
    /// See [`EmbeddingStore::clean`].
    pub async fn clean(&self) -> Result<usize> {
        self.store.clean().await
    }
}

/// Builder for constructing a [`SearchEngine`].
///
/// All fields are required. Call [`build()`](SearchEngineBuilder::build)
/// to validate and produce the engine.
#[derive(Default)]
pub struct SearchEngineBuilder {
    config: Option<IndexConfig>,
    catalog: Option<Arc<dyn Catalog>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SearchEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the file catalog.
    pub fn catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the [`SearchEngine`], validating that all required fields
    /// are set.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if any required field is missing.
    pub fn build(self) -> Result<SearchEngine> {
        let config =
            self.config.ok_or_else(|| IndexError::Config("config is required".to_string()))?;
        let catalog =
            self.catalog.ok_or_else(|| IndexError::Config("catalog is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| IndexError::Config("embedder is required".to_string()))?;
        let store = EmbeddingStore::new(catalog.clone(), embedder.clone(), &config);

        Ok(SearchEngine { config, catalog, embedder, store, corpus: RwLock::new(Vec::new()) })
    }
}
