//! Error types for the `eidetic-catalog` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An I/O failure while reading or writing catalog data.
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// The path the operation touched.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tracked-directory list could not be serialized or parsed.
    #[error("malformed directory list at {}: {source}", path.display())]
    Parse {
        /// The directory list file.
        path: PathBuf,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// A convenience result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
