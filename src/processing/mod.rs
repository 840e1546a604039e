//! Document pipeline: PDF loading, chunking, ingestion, and the session-aware service.

pub mod chunking;
pub mod ingest;
pub mod loader;
pub mod sanitize;
mod service;
pub mod types;

pub use service::{PipelineSettings, QaApi, QaService};
pub use types::{
    AnswerError, AnswerOutcome, ApiKeyOutcome, Chunk, ChunkingError, DocumentSummary,
    IndexedDocument, IngestError, LoadError, Page, QaError, SessionStatus, SourceRef,
    UploadOutcome, UploadedFile,
};
