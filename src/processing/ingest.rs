//! Turn a PDF on disk into an [`IndexedDocument`].

use super::{
    chunking::Chunker,
    loader::{load_pdf, load_pdf_bytes},
    types::{Chunk, IndexedDocument, IngestError, Page},
};
use crate::{
    embedding::{EmbeddingClient, EmbeddingTask},
    index::VectorIndex,
    provider::ProviderError,
};
use std::path::Path;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Identity of the document being indexed.
#[derive(Debug, Clone)]
pub struct DocumentLabel {
    /// Sanitized file name.
    pub filename: String,
    /// Hex SHA-256 of the file contents.
    pub fingerprint: String,
}

/// Load, chunk, and embed the PDF at `path`, returning a fresh index.
///
/// Every call embeds every chunk; nothing is cached between uploads.
pub async fn build_document(
    path: &Path,
    label: DocumentLabel,
    chunker: &Chunker,
    embedder: &dyn EmbeddingClient,
) -> Result<IndexedDocument, IngestError> {
    let pages = load_pdf(path).await?;
    index_pages(pages, label, chunker, embedder).await
}

/// Same as [`build_document`] for a PDF the caller has already read.
pub async fn build_document_from_bytes(
    bytes: Vec<u8>,
    label: DocumentLabel,
    chunker: &Chunker,
    embedder: &dyn EmbeddingClient,
) -> Result<IndexedDocument, IngestError> {
    let pages = load_pdf_bytes(bytes).await?;
    index_pages(pages, label, chunker, embedder).await
}

async fn index_pages(
    pages: Vec<Page>,
    label: DocumentLabel,
    chunker: &Chunker,
    embedder: &dyn EmbeddingClient,
) -> Result<IndexedDocument, IngestError> {
    let chunks: Vec<Chunk> = chunker.chunks(&pages).collect();
    tracing::info!(
        filename = %label.filename,
        pages = pages.len(),
        chunks = chunks.len(),
        chunk_size = chunker.chunk_size(),
        overlap = chunker.chunk_overlap(),
        "Chunked document"
    );
    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument);
    }

    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
    let vectors = embedder
        .embed(texts, EmbeddingTask::RetrievalDocument)
        .await?;
    if vectors.len() != chunks.len() {
        return Err(IngestError::Embedding(ProviderError::InvalidResponse(
            format!(
                "expected {} embeddings, received {}",
                chunks.len(),
                vectors.len()
            ),
        )));
    }

    let chunk_count = chunks.len();
    let index = VectorIndex::from_parts(chunks, vectors)?;
    tracing::debug!(
        filename = %label.filename,
        dimension = index.dimension(),
        "Embedded chunks"
    );

    Ok(IndexedDocument {
        filename: label.filename,
        fingerprint: label.fingerprint,
        page_count: pages.len(),
        chunk_count,
        indexed_at: timestamp(),
        index,
    })
}

/// Current UTC time as RFC3339.
pub(crate) fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}
