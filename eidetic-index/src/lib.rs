//! Search core for Eidetic.
//!
//! This crate provides:
//! - Case-insensitive substring lookup with bounded context windows
//! - Persistent per-file embedding records under the data directory
//! - Cosine-similarity ranking of loaded records
//! - An [`Embedder`] trait with an OpenAI-compatible HTTP implementation
//! - The [`SearchEngine`] facade tying it all together

mod config;
mod embedder;
mod embedding;
mod engine;
mod error;
mod lexical;
mod openai;
mod rank;
mod record;
mod store;

pub use config::{IndexConfig, IndexConfigBuilder};
pub use embedder::Embedder;
pub use embedding::{EMBEDDING_DIM, Embedding};
pub use engine::{SearchEngine, SearchEngineBuilder};
pub use error::{IndexError, Result, ServiceErrorKind};
pub use lexical::{ScanIndex, SearchHit};
pub use openai::OpenAiEmbedder;
pub use record::EmbeddingRecord;
pub use store::{BuildFailure, BuildOutcome, EmbeddingStore};
