//! PDF text extraction.
//!
//! Extraction is CPU-bound and `pdf-extract` may panic on malformed files, so it runs on the
//! blocking pool where a panic surfaces as a `JoinError` instead of taking the worker down.

use super::types::{LoadError, Page};
use std::path::Path;

/// The header must appear within the first kilobyte of the file.
const HEADER_WINDOW: usize = 1024;

/// Read a PDF from disk and return its pages in document order.
pub async fn load_pdf(path: &Path) -> Result<Vec<Page>, LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let pages = load_pdf_bytes(bytes).await?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "Loaded PDF");
    Ok(pages)
}

/// Extract pages from PDF bytes already held in memory.
pub async fn load_pdf_bytes(bytes: Vec<u8>) -> Result<Vec<Page>, LoadError> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes))
        .await
        .map_err(|error| {
            if error.is_panic() {
                LoadError::Panicked(panic_message(error.into_panic()))
            } else {
                LoadError::Panicked(error.to_string())
            }
        })?
}

/// Extract per-page text from in-memory PDF bytes.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<Page>, LoadError> {
    if !has_pdf_header(bytes) {
        return Err(LoadError::NotPdf);
    }
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|error| LoadError::Parse(format!("{error:?}")))?;
    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Page {
            number: index + 1,
            text,
        })
        .collect())
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(5).any(|candidate| candidate == b"%PDF-")
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "extractor panicked".to_string()
    }
}
