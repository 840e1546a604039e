//! Hosted model provider plumbing shared by the embedding and generation clients.
//!
//! Provider failures are reported as a tagged [`ProviderError`] so callers can branch on the
//! failure class (the answer pipeline retries only [`ProviderError::RateLimited`]).

mod gemini;

pub use gemini::{GeminiClient, GeminiConnector};

use crate::embedding::EmbeddingClient;
use crate::generation::GenerationClient;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a hosted model provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider rejected the supplied API key.
    #[error("Provider rejected the API key: {0}")]
    Auth(String),
    /// The provider signalled quota exhaustion.
    #[error("Provider quota exhausted: {0}")]
    RateLimited(String),
    /// The request never produced an HTTP response.
    #[error("Failed to reach provider: {0}")]
    Network(String),
    /// Any other error response.
    #[error("Provider returned {status}: {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider supplied message, or the raw body.
        message: String,
    },
    /// The provider answered with a payload we could not use.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Map a non-success HTTP response onto the error taxonomy.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error);
        let provider_status = envelope
            .as_ref()
            .and_then(|error| error.status.as_deref())
            .unwrap_or_default();
        let message = envelope
            .as_ref()
            .and_then(|error| error.message.clone())
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        if status == StatusCode::TOO_MANY_REQUESTS || provider_status == "RESOURCE_EXHAUSTED" {
            return Self::RateLimited(message);
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            || matches!(provider_status, "UNAUTHENTICATED" | "PERMISSION_DENIED")
            || body.contains("API_KEY_INVALID")
            || message.contains("API key not valid")
        {
            return Self::Auth(message);
        }
        Self::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Builds provider clients bound to a caller supplied API key.
///
/// Keys belong to sessions, not to the process, so clients are created per request.
#[async_trait]
pub trait ModelConnector: Send + Sync {
    /// Embedding client authenticated with `api_key`.
    fn embedding_client(&self, api_key: &str) -> Arc<dyn EmbeddingClient>;

    /// Generation client authenticated with `api_key`.
    fn generation_client(&self, api_key: &str) -> Arc<dyn GenerationClient>;

    /// Fully qualified name of the generation model, e.g. `models/gemini-2.5-flash`.
    fn generation_model(&self) -> &str;

    /// Names of the models visible to `api_key`.
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError>;
}
