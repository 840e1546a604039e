//! In-memory vector index with exact cosine-similarity search.
//!
//! The index is built once from `(vector, chunk)` entries and never mutated afterwards; a new
//! upload builds a new index and the session swaps the `Arc`. Search is a brute-force scan,
//! which is plenty for single-document indexes.

mod similarity;

pub use similarity::cosine_similarity;

use crate::processing::types::Chunk;
use std::cmp::Ordering;
use thiserror::Error;

/// Number of chunks retrieved when the caller does not specify `k`.
pub const DEFAULT_TOP_K: usize = 4;

/// Errors raised while building or querying a [`VectorIndex`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// No `(vector, chunk)` entries were supplied.
    #[error("cannot build an index without entries")]
    Empty,
    /// The first vector had no components.
    #[error("embedding vectors must not be empty")]
    ZeroDimension,
    /// A vector's length differs from the index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension fixed by the first vector.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// A stored vector together with the chunk it represents.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Embedding of `chunk.text`.
    pub vector: Vec<f32>,
    /// Source chunk.
    pub chunk: Chunk,
}

/// A chunk returned by [`VectorIndex::query`].
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Cosine similarity between the query and the chunk vector.
    pub score: f32,
    /// Retrieved chunk.
    pub chunk: Chunk,
}

/// Immutable nearest-neighbour index over chunk embeddings.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index, validating that every vector shares the same non-zero dimension.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self, IndexError> {
        let dimension = entries.first().ok_or(IndexError::Empty)?.vector.len();
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }
        if let Some(entry) = entries.iter().find(|entry| entry.vector.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: entry.vector.len(),
            });
        }
        tracing::debug!(entries = entries.len(), dimension, "Built vector index");
        Ok(Self { dimension, entries })
    }

    /// Pair chunks with their vectors and build an index.
    pub fn from_parts(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { vector, chunk })
            .collect();
        Self::build(entries)
    }

    /// Dimension shared by every stored vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries. Always `false` for a built index.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` most similar chunks, best first.
    ///
    /// Never returns more than `min(k, self.len())` results. Equal scores keep document order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(vector, &entry.vector)))
            .collect();
        scored.sort_by(|left, right| {
            right
                .1
                .partial_cmp(&left.1)
                .unwrap_or(Ordering::Equal)
                .then(left.0.cmp(&right.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                score,
                chunk: self.entries[position].chunk.clone(),
            })
            .collect())
    }
}
