//! Abstraction over hosted text generation.

use crate::provider::ProviderError;
use async_trait::async_trait;

/// Request payload passed to the generation provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully assembled prompt.
    pub prompt: String,
    /// Sampling temperature; `0.0` selects greedy decoding.
    pub temperature: f32,
}

impl GenerationRequest {
    /// Deterministic request for `prompt`.
    pub fn greedy(prompt: String) -> Self {
        Self {
            prompt,
            temperature: 0.0,
        }
    }
}

/// Interface implemented by generative model providers.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError>;
}
