//! Core data types and error definitions for the document pipeline.

use crate::{
    index::{IndexError, VectorIndex},
    provider::ProviderError,
};
use std::path::PathBuf;
use thiserror::Error;

/// Text extracted from one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Extracted text; empty when the page carries no text layer.
    pub text: String,
}

/// A contiguous span of page text used as a retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk contents, an exact slice of the page text.
    pub text: String,
    /// Page the chunk was taken from.
    pub page: usize,
    /// Position of the chunk in document order.
    pub sequence: usize,
    /// Byte offset of `text` inside the page text.
    pub start: usize,
}

/// Errors produced while reading a PDF.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File we attempted to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bytes do not start with a PDF header.
    #[error("file is not a PDF document")]
    NotPdf,
    /// The extractor rejected the document.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    /// The extractor crashed on malformed input.
    #[error("PDF extraction aborted: {0}")]
    Panicked(String),
}

/// Errors produced while configuring the chunker.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk size of zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would swallow whole chunks.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge {
        /// Requested overlap.
        overlap: usize,
        /// Requested chunk size.
        size: usize,
    },
}

/// Errors produced while building an index from a PDF.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading or parsing the PDF failed.
    #[error("Failed to load PDF: {0}")]
    Load(#[from] LoadError),
    /// The PDF contains no extractable text.
    #[error("No extractable text found in the PDF.")]
    EmptyDocument,
    /// The embedding provider failed.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] ProviderError),
    /// The vectors could not be indexed.
    #[error("Failed to build index: {0}")]
    Index(#[from] IndexError),
}

/// Errors produced while answering a question.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The embedding or generation provider failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),
    /// Retrieval failed.
    #[error("Failed to search index: {0}")]
    Index(#[from] IndexError),
}

/// Errors surfaced by the question-answering service.
#[derive(Debug, Error)]
pub enum QaError {
    /// The session has no API key.
    #[error("API Key not set")]
    MissingApiKey,
    /// An upload arrived before the session had an API key.
    #[error("API Key not set. Please set it first.")]
    UploadWithoutApiKey,
    /// The request carried no API key.
    #[error("API key is required")]
    MissingApiKeyInput,
    /// The upload carried no `file` field.
    #[error("No file part")]
    MissingFile,
    /// The upload's `file` field had no filename.
    #[error("No selected file")]
    EmptyFilename,
    /// The uploaded file is not a PDF.
    #[error("Invalid file type. Only PDF allowed.")]
    InvalidFileType,
    /// The request carried no question.
    #[error("Question is required")]
    MissingQuestion,
    /// No document has been indexed for the session.
    #[error("No document processed. Please upload a PDF first.")]
    NoDocument,
    /// Building the index failed.
    #[error("{0}")]
    Ingest(#[from] IngestError),
    /// Answering failed.
    #[error("{0}")]
    Answer(#[from] AnswerError),
    /// Writing the temporary upload failed.
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully indexed PDF.
#[derive(Debug)]
pub struct IndexedDocument {
    /// Sanitized name of the uploaded file.
    pub filename: String,
    /// Hex SHA-256 of the uploaded bytes.
    pub fingerprint: String,
    /// Number of pages in the PDF.
    pub page_count: usize,
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// RFC3339 timestamp of indexing.
    pub indexed_at: String,
    /// Vector index over the chunks.
    pub index: VectorIndex,
}

/// Summary of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Sanitized name of the uploaded file.
    pub filename: String,
    /// Number of pages in the PDF.
    pub pages: usize,
    /// Number of indexed chunks.
    pub chunks: usize,
    /// Hex SHA-256 of the uploaded bytes.
    pub fingerprint: String,
}

/// Result of setting a session API key.
#[derive(Debug, Clone)]
pub struct ApiKeyOutcome {
    /// Models visible to the key; empty when validation failed.
    pub models: Vec<String>,
    /// Validation failure, reported but not fatal.
    pub validation_error: Option<String>,
}

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Generated answer text.
    pub answer: String,
    /// Retrieved chunks in ranking order.
    pub sources: Vec<SourceRef>,
}

/// Reference to a retrieved chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    /// Page the chunk came from.
    pub page: usize,
    /// Chunk position in document order.
    pub sequence: usize,
    /// Cosine similarity to the question.
    pub score: f32,
}

/// Raw upload handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client supplied filename, unsanitized.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Session state visible to clients.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Session identifier.
    pub session_id: String,
    /// RFC3339 time the session was created; `None` for a session that does not exist yet.
    pub created_at: Option<String>,
    /// Whether an API key is set.
    pub api_key_set: bool,
    /// Indexed document, if any.
    pub document: Option<DocumentSummary>,
}

/// Metadata of the indexed document.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    /// Sanitized file name.
    pub filename: String,
    /// Page count.
    pub pages: usize,
    /// Chunk count.
    pub chunks: usize,
    /// Hex SHA-256 of the uploaded bytes.
    pub fingerprint: String,
    /// RFC3339 timestamp of indexing.
    pub indexed_at: String,
}

impl From<&IndexedDocument> for DocumentSummary {
    fn from(document: &IndexedDocument) -> Self {
        Self {
            filename: document.filename.clone(),
            pages: document.page_count,
            chunks: document.chunk_count,
            fingerprint: document.fingerprint.clone(),
            indexed_at: document.indexed_at.clone(),
        }
    }
}
