//! Question-answering service coordinating sessions, ingestion, and answering.

use crate::{
    answer::{AnswerGenerator, RetryPolicy},
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::Chunker,
        ingest::{DocumentLabel, build_document},
        sanitize::{fingerprint, has_pdf_extension, sanitize_string, secure_filename},
        types::{
            AnswerOutcome, ApiKeyOutcome, ChunkingError, DocumentSummary, QaError, SessionStatus,
            UploadOutcome, UploadedFile,
        },
    },
    provider::ModelConnector,
    session::{Session, SessionStore},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tunables for the ingestion and answering pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory receiving uploads while they are processed.
    pub upload_dir: PathBuf,
    /// Chunker applied to extracted pages.
    pub chunker: Chunker,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Retry policy for rate-limited questions.
    pub retry: RetryPolicy,
}

impl PipelineSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ChunkingError> {
        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            chunker: Chunker::new(config.chunk_size, config.chunk_overlap)?,
            top_k: config.retrieval_top_k,
            retry: RetryPolicy::new(config.rate_limit_max_attempts, config.rate_limit_wait()),
        })
    }
}

/// Abstraction over the question-answering pipeline used by the HTTP surface.
#[async_trait]
pub trait QaApi: Send + Sync {
    /// Mint a new session and return its id.
    async fn create_session(&self) -> String;

    /// Store an API key for the session and report the models it can see.
    async fn set_api_key(
        &self,
        session_id: &str,
        api_key: Option<String>,
    ) -> Result<ApiKeyOutcome, QaError>;

    /// Index an uploaded PDF, replacing the session's previous document.
    async fn upload(
        &self,
        session_id: &str,
        file: Option<UploadedFile>,
    ) -> Result<UploadOutcome, QaError>;

    /// Answer a question against the session's document.
    async fn ask(&self, session_id: &str, question: Option<String>)
    -> Result<AnswerOutcome, QaError>;

    /// Describe the session's state.
    async fn status(&self, session_id: &str) -> SessionStatus;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Default [`QaApi`] implementation backed by a [`ModelConnector`].
///
/// Construct it once near process start and share it through an `Arc`.
pub struct QaService {
    sessions: SessionStore,
    connector: Arc<dyn ModelConnector>,
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
}

impl QaService {
    /// Build a service using `connector` for all provider traffic.
    pub fn new(connector: Arc<dyn ModelConnector>, settings: PipelineSettings) -> Self {
        Self {
            sessions: SessionStore::new(),
            connector,
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Existing session holding an API key; unknown sessions have none.
    async fn keyed_session(
        &self,
        session_id: &str,
        missing: QaError,
    ) -> Result<(Arc<Session>, String), QaError> {
        let Some(session) = self.sessions.get(session_id).await else {
            return Err(missing);
        };
        let api_key = session.api_key().await.ok_or(missing)?;
        Ok((session, api_key))
    }
}

#[async_trait]
impl QaApi for QaService {
    async fn create_session(&self) -> String {
        let session = self.sessions.create().await;
        tracing::info!(session = session.id(), "Session created");
        session.id().to_string()
    }

    async fn set_api_key(
        &self,
        session_id: &str,
        api_key: Option<String>,
    ) -> Result<ApiKeyOutcome, QaError> {
        let api_key = sanitize_string(api_key).ok_or(QaError::MissingApiKeyInput)?;
        let session = self.sessions.get_or_create(session_id).await;
        session.set_api_key(api_key.clone()).await;

        match self.connector.list_models(&api_key).await {
            Ok(models) => {
                let expected = self.connector.generation_model();
                if !models.iter().any(|model| model == expected) {
                    tracing::warn!(
                        session = session_id,
                        model = expected,
                        available = models.len(),
                        "Configured generation model not visible to this key"
                    );
                }
                tracing::info!(session = session_id, models = models.len(), "API key set");
                Ok(ApiKeyOutcome {
                    models,
                    validation_error: None,
                })
            }
            Err(error) => {
                tracing::warn!(session = session_id, error = %error, "API key validation skipped");
                Ok(ApiKeyOutcome {
                    models: Vec::new(),
                    validation_error: Some(error.to_string()),
                })
            }
        }
    }

    async fn upload(
        &self,
        session_id: &str,
        file: Option<UploadedFile>,
    ) -> Result<UploadOutcome, QaError> {
        let (session, api_key) = self
            .keyed_session(session_id, QaError::UploadWithoutApiKey)
            .await?;
        let file = file.ok_or(QaError::MissingFile)?;
        if file.filename.is_empty() {
            return Err(QaError::EmptyFilename);
        }
        if !has_pdf_extension(&file.filename) {
            return Err(QaError::InvalidFileType);
        }
        let filename = secure_filename(&file.filename).ok_or(QaError::InvalidFileType)?;

        let label = DocumentLabel {
            fingerprint: fingerprint(&file.bytes),
            filename,
        };
        tokio::fs::create_dir_all(&self.settings.upload_dir).await?;
        let stored = TempUpload::new(&self.settings.upload_dir, &label.filename);
        tokio::fs::write(stored.path(), &file.bytes).await?;
        tracing::info!(
            session = session_id,
            filename = %label.filename,
            bytes = file.bytes.len(),
            "Processing upload"
        );

        let embedder = self.connector.embedding_client(&api_key);
        let previous = session.document().await;
        let built = build_document(
            stored.path(),
            label,
            &self.settings.chunker,
            embedder.as_ref(),
        )
        .await;
        drop(stored);

        match built {
            Ok(document) => {
                let outcome = UploadOutcome {
                    filename: document.filename.clone(),
                    pages: document.page_count,
                    chunks: document.chunk_count,
                    fingerprint: document.fingerprint.clone(),
                };
                self.metrics.record_document(document.chunk_count as u64);
                session.replace_document(Arc::new(document)).await;
                tracing::info!(
                    session = session_id,
                    filename = %outcome.filename,
                    pages = outcome.pages,
                    chunks = outcome.chunks,
                    "Document indexed"
                );
                Ok(outcome)
            }
            Err(error) => {
                if let Some(previous) = previous {
                    if session.discard_document(&previous).await {
                        tracing::warn!(session = session_id, "Discarded previous document after failed rebuild");
                    }
                }
                tracing::error!(session = session_id, error = %error, "Upload failed");
                Err(error.into())
            }
        }
    }

    async fn ask(
        &self,
        session_id: &str,
        question: Option<String>,
    ) -> Result<AnswerOutcome, QaError> {
        let (session, api_key) = self
            .keyed_session(session_id, QaError::MissingApiKey)
            .await?;
        let document = session.document().await.ok_or(QaError::NoDocument)?;
        let question = sanitize_string(question).ok_or(QaError::MissingQuestion)?;

        let answerer = AnswerGenerator::new(
            self.connector.embedding_client(&api_key),
            self.connector.generation_client(&api_key),
        )
        .with_top_k(self.settings.top_k)
        .with_retry(self.settings.retry)
        .with_metrics(self.metrics.clone());

        let outcome = answerer
            .answer(&document.index, &question)
            .await
            .inspect_err(|error| {
                tracing::error!(session = session_id, error = %error, "Question failed");
            })?;
        self.metrics.record_answer();
        tracing::info!(
            session = session_id,
            filename = %document.filename,
            sources = outcome.sources.len(),
            "Question answered"
        );
        Ok(outcome)
    }

    async fn status(&self, session_id: &str) -> SessionStatus {
        let Some(session) = self.sessions.get(session_id).await else {
            return SessionStatus {
                session_id: session_id.to_string(),
                created_at: None,
                api_key_set: false,
                document: None,
            };
        };
        SessionStatus {
            session_id: session.id().to_string(),
            created_at: Some(session.created_at().to_string()),
            api_key_set: session.api_key().await.is_some(),
            document: session
                .document()
                .await
                .map(|document| DocumentSummary::from(document.as_ref())),
        }
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Uploaded file on disk, removed when dropped.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn new(dir: &Path, filename: &str) -> Self {
        Self {
            path: dir.join(format!("{}-{filename}", uuid::Uuid::new_v4())),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed upload"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %self.path.display(), error = %error, "Failed to remove upload")
            }
        }
    }
}
