//! Embedder backed by an OpenAI-compatible embeddings endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::embedder::Embedder;
use crate::embedding::{EMBEDDING_DIM, Embedding};
use crate::error::{IndexError, Result, ServiceErrorKind};

/// The default base URL for the embeddings API.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default embedding model.
pub(crate) const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// The default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The default number of attempts per input.
const DEFAULT_MAX_RETRIES: usize = 3;

/// An [`Embedder`] backed by an OpenAI-compatible embeddings API.
///
/// Sends one input per request (`{ "model": …, "input": … }`) with bearer
/// authentication. Transport errors, HTTP 429, and 5xx responses are
/// retried with exponential backoff; every other failure is returned to
/// the caller carrying its [`ServiceErrorKind`].
///
/// # Configuration
///
/// - `api_key`: from the constructor or the `OPENAI_API_KEY` environment
///   variable.
/// - `model`: defaults to `text-embedding-ada-002`.
/// - `base_url`: defaults to `https://api.openai.com/v1`.
///
/// # Example
///
/// ```rust,ignore
/// use eidetic_index::OpenAiEmbedder;
///
/// let embedder = OpenAiEmbedder::from_env()?;
/// let embedding = embedder.embed("hello world").await?;
/// ```
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_retries: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder with the given API key and default settings.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if the key is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(IndexError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key,
            endpoint: format!("{DEFAULT_BASE_URL}/embeddings"),
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a new embedder from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            IndexError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the model name sent with each request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the embedder at a different OpenAI-compatible base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        self
    }

    /// Set the maximum number of attempts per input (at least one).
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout, rebuilding the underlying client.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if the HTTP client cannot be
    /// constructed.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    async fn request(&self, text: &str) -> std::result::Result<Embedding, AttemptError> {
        let request_body = EmbeddingRequest { model: &self.model, input: text };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                AttemptError {
                    error: IndexError::Service {
                        kind: ServiceErrorKind::Transport,
                        message: format!("request failed: {e}"),
                    },
                    retryable: true,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(%status, "embedding service returned an error");
            return Err(AttemptError {
                error: IndexError::Service {
                    kind: ServiceErrorKind::Status,
                    message: format!("service returned {status}: {detail}"),
                },
                retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse embedding response");
            AttemptError {
                error: IndexError::Service {
                    kind: ServiceErrorKind::Response,
                    message: format!("failed to parse response: {e}"),
                },
                retryable: false,
            }
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| Embedding::new(d.embedding))
            .ok_or_else(|| AttemptError {
                error: IndexError::Service {
                    kind: ServiceErrorKind::Response,
                    message: "response contained no embeddings".to_string(),
                },
                retryable: false,
            })?;

        if embedding.len() != EMBEDDING_DIM {
            return Err(AttemptError {
                error: IndexError::MalformedVector {
                    reason: format!(
                        "service returned {} components, expected {EMBEDDING_DIM}",
                        embedding.len()
                    ),
                },
                retryable: false,
            });
        }

        Ok(embedding)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| IndexError::Config(format!("failed to build HTTP client: {e}")))
}

/// One failed attempt, with whether it is worth retrying.
struct AttemptError {
    error: IndexError,
    retryable: bool,
}

/// Exponential backoff, capped at 16 seconds.
fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embedder implementation ────────────────────────────────────────

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        debug!(model = %self.model, text_len = text.len(), "requesting embedding");

        let mut attempt = 0usize;
        loop {
            match self.request(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(failure) if failure.retryable && attempt + 1 < self.max_retries => {
                    attempt += 1;
                    let delay = retry_backoff(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "retrying embedding request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}
