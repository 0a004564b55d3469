//! Persisted embedding records and their storage naming scheme.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// Number of content characters used to derive a record's storage name.
const KEY_CHARS: usize = 10;

/// One persisted embedding, tied to the corpus file it was computed from.
///
/// Serialized as JSON with camelCase keys; the embedding itself is a
/// plain JSON array. One record exists per (file, build): rebuilding a
/// file writes a new record and leaves the old one for the store's sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    /// Where this record lives on disk.
    pub storage_path: PathBuf,
    /// The corpus file the embedding was computed from.
    pub source_path: PathBuf,
    /// The embedding vector.
    pub embedding: Embedding,
}

/// Derive the storage key for a file from its content: the first
/// [`KEY_CHARS`] characters of the raw text, mapped to a filename-safe
/// alphabet.
///
/// Build and load share this derivation, so records written by one are
/// found by the other.
pub fn base_key(contents: &str) -> String {
    contents
        .chars()
        .take(KEY_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Assemble a record filename from a base key and a collision suffix.
///
/// Suffix `0` is the plain key; higher suffixes append `-n`.
pub fn record_filename(key: &str, suffix: usize) -> String {
    if suffix == 0 { format!("{key}.json") } else { format!("{key}-{suffix}.json") }
}
