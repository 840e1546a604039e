//! Retrieval-augmented answering.
//!
//! Retrieved chunks are "stuffed" verbatim into a single prompt: no summarisation and no
//! map-reduce, so the usable context is bounded by `top_k` chunks and the model's window.

mod retry;

pub use retry::{RateLimited, RetryPolicy};

use crate::{
    embedding::{EmbeddingClient, embed_query},
    generation::{GenerationClient, GenerationRequest},
    index::{DEFAULT_TOP_K, ScoredChunk, VectorIndex},
    metrics::PipelineMetrics,
    processing::types::{AnswerError, AnswerOutcome, SourceRef},
};
use std::sync::Arc;

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Assemble the prompt for `question` from retrieved chunks, best match first.
pub fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> String {
    let context = chunks
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{PROMPT_PREAMBLE}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}

/// Answers questions against a [`VectorIndex`].
pub struct AnswerGenerator {
    embedder: Arc<dyn EmbeddingClient>,
    generator: Arc<dyn GenerationClient>,
    top_k: usize,
    retry: RetryPolicy,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl AnswerGenerator {
    /// Generator with the default `top_k` and retry policy.
    pub fn new(embedder: Arc<dyn EmbeddingClient>, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            embedder,
            generator,
            top_k: DEFAULT_TOP_K,
            retry: RetryPolicy::default(),
            metrics: None,
        }
    }

    /// Number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retry policy applied to rate-limited attempts.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Count retries in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Retrieve context for `question` and generate an answer.
    ///
    /// Each attempt embeds the question, searches the index, and calls the model at
    /// temperature 0. Only rate-limited attempts are retried.
    pub async fn answer(
        &self,
        index: &VectorIndex,
        question: &str,
    ) -> Result<AnswerOutcome, AnswerError> {
        self.retry
            .run(|attempt| async move {
                if attempt > 1 {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_rate_limit_retry();
                    }
                }
                let query = embed_query(self.embedder.as_ref(), question).await?;
                let hits = index.query(&query, self.top_k)?;
                tracing::debug!(attempt, retrieved = hits.len(), "Retrieved context");

                let prompt = build_prompt(question, &hits);
                let answer = self
                    .generator
                    .generate(GenerationRequest::greedy(prompt))
                    .await?;
                Ok::<_, AnswerError>(AnswerOutcome {
                    answer,
                    sources: hits
                        .iter()
                        .map(|hit| SourceRef {
                            page: hit.chunk.page,
                            sequence: hit.chunk.sequence,
                            score: hit.score,
                        })
                        .collect(),
                })
            })
            .await
    }
}
