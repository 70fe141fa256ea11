//! Document chunking.
//!
//! [`SeparatorChunker`] splits documents into bounded-size overlapping
//! segments along natural text boundaries: paragraph breaks first, then
//! line breaks, sentence-terminal periods, plain spaces, and finally hard
//! character cuts when nothing else fits.

use crate::document::{Document, Segment};

/// A strategy for splitting documents into segments.
///
/// Implementations produce [`Segment`]s with text, offsets, and metadata
/// but no embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into segments, in document order.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Segment>;
}

/// Separator classes tried in priority order when looking for a cut point.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits text into segments of at most `chunk_size` bytes, preferring
/// natural boundaries and carrying `chunk_overlap` bytes of trailing text
/// into the next segment as a prefix.
///
/// For each window the splitter scans backwards from the size budget for
/// the highest-priority separator that yields a cut; only when no
/// separator occurs does it fall back to a hard character cut. A document
/// shorter than `chunk_size` yields exactly one segment equal to the whole
/// document.
///
/// Each segment inherits the parent document's metadata plus a
/// `chunk_index` field, and records its byte offset into the parent text,
/// so `(document_id, start_offset)` is unique across the document.
#[derive(Debug, Clone)]
pub struct SeparatorChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SeparatorChunker {
    /// Create a new `SeparatorChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — soft maximum segment length in bytes
    /// * `chunk_overlap` — trailing bytes shared with the next segment;
    ///   must be less than `chunk_size` (enforced by [`RagConfig`](crate::RagConfig))
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Find the end of the segment starting at `start`.
    ///
    /// Tries each separator class in priority order, taking the last
    /// occurrence within the size budget so the piece before the cut is as
    /// large as possible while staying within `chunk_size`. The separator
    /// stays attached to the preceding segment.
    fn cut_point(&self, text: &str, start: usize) -> usize {
        let len = text.len();
        if len - start <= self.chunk_size {
            return len;
        }

        let budget_end = floor_char_boundary(text, start + self.chunk_size);
        let window = &text[start..budget_end];

        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                if pos > 0 {
                    return start + pos + separator.len();
                }
            }
        }

        // No separator fits — hard cut at the character boundary.
        if budget_end > start {
            budget_end
        } else {
            ceil_char_boundary(text, start + 1)
        }
    }
}

/// Round `index` up to the nearest UTF-8 character boundary.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Round `index` down to the nearest UTF-8 character boundary.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl Chunker for SeparatorChunker {
    fn chunk(&self, document: &Document) -> Vec<Segment> {
        let text = &document.text;
        if text.is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0usize;

        while start < text.len() {
            let end = self.cut_point(text, start);

            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());

            segments.push(Segment {
                document_id: document.id.clone(),
                text: text[start..end].to_string(),
                start_offset: start,
                metadata,
            });
            chunk_index += 1;

            if end >= text.len() {
                break;
            }

            // Next segment reuses the final `chunk_overlap` bytes of this
            // one as its prefix. Segments cut short by a separator can be
            // smaller than the overlap; step past them instead of stalling.
            let mut next = floor_char_boundary(text, end.saturating_sub(self.chunk_overlap));
            if next <= start {
                next = end;
            }
            start = next;
        }

        segments
    }
}
