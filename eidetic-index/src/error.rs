//! Error types for the `eidetic-index` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Classifies embedding service failures so callers can branch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The request never produced an HTTP response.
    Transport,
    /// The service answered with a non-success status.
    Status,
    /// The response body could not be interpreted.
    Response,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Status => write!(f, "status"),
            Self::Response => write!(f, "response"),
        }
    }
}

/// Errors that can occur in index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An I/O failure while reading or writing index data.
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// The path the operation touched.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A failure reported by the file catalog.
    #[error(transparent)]
    Catalog(#[from] eidetic_catalog::CatalogError),

    /// A failure talking to the embedding service.
    #[error("embedding service error ({kind}): {message}")]
    Service {
        /// Which stage of the request failed.
        kind: ServiceErrorKind,
        /// A description of the failure.
        message: String,
    },

    /// An embedding vector with the wrong length or a non-finite element.
    #[error("malformed embedding vector: {reason}")]
    MalformedVector {
        /// What made the vector unusable.
        reason: String,
    },

    /// A persisted record that could not be read back.
    #[error("malformed record at {}: {message}", path.display())]
    MalformedRecord {
        /// The record file on disk.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Two vectors of different lengths were compared.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the left-hand vector.
        left: usize,
        /// Length of the right-hand vector.
        right: usize,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
