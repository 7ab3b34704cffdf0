//! Fixed-size text chunking.
//!
//! Chunks are windows of at most `max_chars` characters with no overlap.
//! Boundaries ignore sentences and paragraphs, so a chunk may end
//! mid-sentence.

use crate::model::Chunk;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Concatenating the chunks in order gives back `text`. Empty input yields no
/// chunks. A `max_chars` of zero is treated as one.
pub fn split_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(chunk_count(text.chars().count(), max_chars));
    let mut start = 0;
    let mut chars_in_window = 0;

    for (byte_idx, _) in text.char_indices() {
        if chars_in_window == max_chars {
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[start..byte_idx].to_string(),
            });
            start = byte_idx;
            chars_in_window = 0;
        }
        chars_in_window += 1;
    }

    if start < text.len() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: text[start..].to_string(),
        });
    }

    chunks
}

/// Number of chunks `split_text` produces for a text of `total_chars`.
pub fn chunk_count(total_chars: usize, max_chars: usize) -> usize {
    total_chars.div_ceil(max_chars.max(1))
}
