//! Recursive character splitting with overlap.
//!
//! Page text is cut into pieces by walking a separator hierarchy: paragraphs, then lines, then
//! sentences, then words. A piece that fits the character budget is kept whole; a larger one is
//! cut again with the next level down. Once no separator is left the piece is an indivisible
//! token and is kept whole even when it exceeds the budget.
//!
//! Pieces are then merged greedily into windows of at most `chunk_size` characters. When a
//! window is emitted, leading pieces are dropped until what remains fits the overlap budget and
//! leaves room for the next piece, so consecutive chunks share up to `chunk_overlap` characters.
//!
//! Chunks are exact slices of the page text (trimmed of surrounding whitespace) and carry their
//! byte offset, so the page text can be stitched back together from them.

use super::types::{Chunk, ChunkingError, Page};
use std::collections::VecDeque;
use std::ops::Range;

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default maximum overlap between neighbouring chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separator hierarchy, coarsest first.
const SEPARATOR_LEVELS: &[&[&str]] = &[
    &["\n\n"],
    &["\n"],
    &[". ", "? ", "! "],
    &[" ", "\t"],
];

/// Splits pages into overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Build a chunker; the overlap must be smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maximum overlap in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily chunk `pages` in document order.
    ///
    /// Each page is split only when the iterator reaches it; calling `chunks` again starts over.
    pub fn chunks<'a>(&'a self, pages: &'a [Page]) -> impl Iterator<Item = Chunk> + 'a {
        pages
            .iter()
            .flat_map(move |page| {
                self.spans(&page.text)
                    .into_iter()
                    .map(move |span| (page, span))
            })
            .enumerate()
            .map(|(sequence, (page, span))| Chunk {
                text: page.text[span.clone()].to_string(),
                page: page.number,
                sequence,
                start: span.start,
            })
    }

    /// Byte ranges of the chunks of `text`, in order.
    pub(crate) fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut pieces = Vec::new();
        self.collect_pieces(text, 0..text.len(), 0, &mut pieces);
        self.merge(text, pieces)
    }

    fn collect_pieces(
        &self,
        text: &str,
        range: Range<usize>,
        level: usize,
        out: &mut Vec<Range<usize>>,
    ) {
        let segment = &text[range.clone()];
        if char_len(segment) <= self.chunk_size {
            out.push(range);
            return;
        }

        for (depth, separators) in SEPARATOR_LEVELS.iter().enumerate().skip(level) {
            let cuts = cut_points(segment, separators);
            if cuts.is_empty() {
                continue;
            }
            let mut start = 0;
            for end in cuts.into_iter().chain(std::iter::once(segment.len())) {
                self.collect_pieces(text, range.start + start..range.start + end, depth + 1, out);
                start = end;
            }
            return;
        }

        // No separator left: an indivisible token.
        out.push(range);
    }

    fn merge(&self, text: &str, pieces: Vec<Range<usize>>) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(&text[piece.clone()]);
            if total + len > self.chunk_size && !window.is_empty() {
                push_window(text, &window, &mut spans);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        if !window.is_empty() {
            push_window(text, &window, &mut spans);
        }
        spans
    }
}

fn push_window(text: &str, window: &VecDeque<(Range<usize>, usize)>, spans: &mut Vec<Range<usize>>) {
    let (Some((first, _)), Some((last, _))) = (window.front(), window.back()) else {
        return;
    };
    let span = trim_span(text, first.start..last.end);
    if !span.is_empty() {
        spans.push(span);
    }
}

/// Offsets just past every separator occurrence, excluding the segment end.
fn cut_points(segment: &str, separators: &[&str]) -> Vec<usize> {
    let mut cuts: Vec<usize> = separators
        .iter()
        .flat_map(|separator| {
            segment
                .match_indices(separator)
                .map(move |(index, _)| index + separator.len())
        })
        .filter(|&end| end < segment.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

fn trim_span(text: &str, span: Range<usize>) -> Range<usize> {
    let slice = &text[span.clone()];
    let trimmed_start = slice.trim_start();
    if trimmed_start.is_empty() {
        return span.start..span.start;
    }
    let start = span.start + (slice.len() - trimmed_start.len());
    let end = start + trimmed_start.trim_end().len();
    start..end
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
