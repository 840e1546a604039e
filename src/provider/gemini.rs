//! Google Gemini REST adapter.
//!
//! Speaks the `v1beta` Generative Language API directly over `reqwest`: `batchEmbedContents`
//! for embeddings, `generateContent` for answers, and `models` for key validation. The API key
//! travels in the `x-goog-api-key` header so it never ends up in logged URLs.

use super::{ModelConnector, ProviderError};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingTask};
use crate::generation::{GenerationClient, GenerationRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const API_KEY_HEADER: &str = "x-goog-api-key";
/// `batchEmbedContents` accepts at most 100 requests per call.
const MAX_EMBED_BATCH: usize = 100;

/// Creates Gemini clients for session API keys.
pub struct GeminiConnector {
    http: Client,
    base_url: String,
    embedding_model: String,
    generation_model: String,
}

impl GeminiConnector {
    /// Build a connector targeting `base_url` with the given model pair.
    pub fn new(
        base_url: &str,
        embedding_model: &str,
        generation_model: &str,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ProviderError::Network(error.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model: qualify_model(embedding_model),
            generation_model: qualify_model(generation_model),
        })
    }

    /// Build a connector from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(
            &config.gemini_base_url,
            &config.embedding_model,
            &config.generation_model,
        )
    }

    fn client(&self, api_key: &str) -> Arc<GeminiClient> {
        Arc::new(GeminiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            embedding_model: self.embedding_model.clone(),
            generation_model: self.generation_model.clone(),
        })
    }
}

#[async_trait]
impl ModelConnector for GeminiConnector {
    fn embedding_client(&self, api_key: &str) -> Arc<dyn EmbeddingClient> {
        self.client(api_key)
    }

    fn generation_client(&self, api_key: &str) -> Arc<dyn GenerationClient> {
        self.client(api_key)
    }

    fn generation_model(&self) -> &str {
        &self.generation_model
    }

    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        self.client(api_key).list_models().await
    }
}

/// Gemini client bound to one API key.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
}

impl GeminiClient {
    /// Enumerate every model name visible to the key, following pagination.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let mut request = self
                .http
                .get(format!("{}/models", self.base_url))
                .query(&[("pageSize", "1000")]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ModelsPage = self.send(request).await?.json().await?;
            names.extend(page.models.into_iter().map(|model| model.name));
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    tracing::warn!(token = %token, "Provider repeated a model page token");
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        tracing::debug!(count = names.len(), "Listed provider models");
        Ok(names)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_response(status, &body))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let payload = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.embedding_model,
                    content: Content::user(text),
                    task_type: task.as_str(),
                })
                .collect(),
        };
        let url = format!(
            "{}/{}:batchEmbedContents",
            self.base_url, self.embedding_model
        );
        let body: BatchEmbedResponse = self
            .send(self.http.post(url).json(&payload))
            .await?
            .json()
            .await?;
        if body.embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                body.embeddings.len()
            )));
        }
        Ok(body
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

#[async_trait]
impl EmbeddingClient for GeminiClient {
    async fn embed(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        tracing::debug!(
            model = %self.embedding_model,
            count = texts.len(),
            task = task.as_str(),
            "Generating embeddings"
        );
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_EMBED_BATCH) {
            vectors.extend(self.embed_batch(batch, task).await?);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let payload = GenerateRequest {
            contents: vec![Content::user(&request.prompt)],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };
        let url = format!("{}/{}:generateContent", self.base_url, self.generation_model);
        tracing::debug!(
            model = %self.generation_model,
            prompt_chars = request.prompt.chars().count(),
            "Requesting completion"
        );
        let body: GenerateResponse = self
            .send(self.http.post(url).json(&payload))
            .await?
            .json()
            .await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            let reason = body
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .map(|reason| format!("prompt blocked: {reason}"))
                .unwrap_or_else(|| "no text in response".to_string());
            return Err(ProviderError::InvalidResponse(reason));
        }
        Ok(text.trim().to_string())
    }
}

fn qualify_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsPage {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}
