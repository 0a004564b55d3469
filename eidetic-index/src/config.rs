//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::openai::DEFAULT_MODEL;

/// Environment variable that overrides the data directory.
const DATA_DIR_ENV: &str = "EIDETIC_DATA_DIR";

/// Directory name used under the home directory by default.
const DEFAULT_DATA_DIR_NAME: &str = ".eidetic";

/// Configuration for a [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Root directory holding the directory list and stored embeddings.
    pub data_dir: PathBuf,
    /// Embedding model requested from the service.
    pub model: String,
    /// Maximum number of embedding requests in flight during a build.
    pub max_concurrency: usize,
    /// Timeout applied to each embedding request.
    pub request_timeout: Duration,
    /// Attempts per embedding request before giving up.
    pub max_retries: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            model: DEFAULT_MODEL.to_string(),
            max_concurrency: 8,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl IndexConfig {
    /// Create a builder for custom configuration.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

/// `EIDETIC_DATA_DIR` when set, otherwise `~/.eidetic`, falling back to
/// a relative `.eidetic` when no home directory can be resolved.
fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME))
}

/// Builder for [`IndexConfig`].
///
/// # Example
///
/// ```rust,ignore
/// let config = IndexConfig::builder()
///     .data_dir("/tmp/eidetic")
///     .max_concurrency(4)
///     .build()?;
/// ```
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the data directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the embedding model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the build concurrency limit.
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.config.max_concurrency = limit;
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the attempts per embedding request.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] when a limit is zero or the model
    /// name is empty.
    pub fn build(self) -> Result<IndexConfig> {
        if self.config.model.is_empty() {
            return Err(IndexError::Config("model name must not be empty".into()));
        }
        if self.config.max_concurrency == 0 {
            return Err(IndexError::Config("max_concurrency must be at least 1".into()));
        }
        if self.config.max_retries == 0 {
            return Err(IndexError::Config("max_retries must be at least 1".into()));
        }
        if self.config.request_timeout.is_zero() {
            return Err(IndexError::Config("request_timeout must be non-zero".into()));
        }
        Ok(self.config)
    }
}
