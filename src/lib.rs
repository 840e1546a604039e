#![deny(missing_docs)]

//! Core library for docqa: ask questions about an uploaded PDF.

/// Retrieval-augmented answer generation with rate-limit retries.
pub mod answer;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction.
pub mod embedding;
/// Text generation client abstraction.
pub mod generation;
/// In-memory vector index.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
/// Hosted model provider adapters.
pub mod provider;
/// Per-session state.
pub mod session;
