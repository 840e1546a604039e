use crate::provider::ProviderError;
use async_trait::async_trait;

/// Purpose hint forwarded to the embedding model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Text that will be stored in the index.
    RetrievalDocument,
    /// Question text used to search the index.
    RetrievalQuery,
}

impl EmbeddingTask {
    /// Wire name understood by the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            Self::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce one embedding per input text, in input order.
    async fn embed(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Embed a single question.
pub async fn embed_query(
    client: &dyn EmbeddingClient,
    question: &str,
) -> Result<Vec<f32>, ProviderError> {
    let mut vectors = client
        .embed(vec![question.to_string()], EmbeddingTask::RetrievalQuery)
        .await?;
    match (vectors.pop(), vectors.is_empty()) {
        (Some(vector), true) => Ok(vector),
        _ => Err(ProviderError::InvalidResponse(
            "expected exactly one query embedding".into(),
        )),
    }
}
