//! Per-session state: the API key and the indexed document.
//!
//! Sessions are keyed by an opaque id carried in the `x-session-id` header; requests without
//! one share the [`DEFAULT_SESSION_ID`] session. The document is held as an `Arc` and replaced
//! wholesale, so a question that already cloned the `Arc` keeps answering against the index it
//! started with while an upload swaps in a new one.

use crate::processing::{ingest::timestamp, types::IndexedDocument};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session used by requests that do not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

const MAX_SESSION_ID_LEN: usize = 128;

/// Whether `id` is acceptable as a session identifier.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// State owned by one session.
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: String,
    api_key: RwLock<Option<String>>,
    document: RwLock<Option<Arc<IndexedDocument>>>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: timestamp(),
            api_key: RwLock::new(None),
            document: RwLock::new(None),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// RFC3339 creation time.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Current API key, if one was set.
    pub async fn api_key(&self) -> Option<String> {
        self.api_key.read().await.clone()
    }

    /// Replace the API key. The indexed document is kept.
    pub async fn set_api_key(&self, api_key: String) {
        *self.api_key.write().await = Some(api_key);
    }

    /// Snapshot of the indexed document.
    pub async fn document(&self) -> Option<Arc<IndexedDocument>> {
        self.document.read().await.clone()
    }

    /// Install a freshly built document, returning the one it replaced.
    pub async fn replace_document(
        &self,
        document: Arc<IndexedDocument>,
    ) -> Option<Arc<IndexedDocument>> {
        self.document.write().await.replace(document)
    }

    /// Drop the indexed document only if it is still `expected`.
    ///
    /// Returns `false` when another upload has installed a different document since `expected`
    /// was read; that document is left in place.
    pub async fn discard_document(&self, expected: &Arc<IndexedDocument>) -> bool {
        let mut slot = self.document.write().await;
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, expected))
        {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `id` without creating it.
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Look up `id`, creating the session on first use.
    pub async fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = id, "Created session");
                Arc::new(Session::new(id.to_string()))
            })
            .clone()
    }

    /// Mint a session with a fresh random id.
    pub async fn create(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        self.get_or_create(&id).await
    }

    /// Number of sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session exists yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
