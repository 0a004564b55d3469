//! Embedding service trait for turning text into vectors.

use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::error::Result;

/// A service that turns text into fixed-dimension embedding vectors.
///
/// Implementations wrap a concrete backend behind a unified async
/// interface; the store and ranker depend only on this trait, and tests
/// substitute deterministic implementations.
///
/// # Example
///
/// ```rust,ignore
/// use eidetic_index::Embedder;
///
/// let embedder = MyEmbedder::new();
/// let embedding = embedder.embed("hello world").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Return the dimensionality of embeddings produced by this service.
    fn dimensions(&self) -> usize;
}
