//! Recursive character text splitting.
//!
//! Splits prefer, in order: paragraph breaks, line breaks, sentence-ending
//! periods, spaces. Hard character cuts happen only when none of those
//! separators exist in the window. Pieces produced by a split are merged
//! back greedily up to `chunk_size`, carrying up to `chunk_overlap`
//! characters of trailing context into the next chunk.
//!
//! Chunk boundaries are an observable behavior of the system (they decide
//! what gets retrieved), so the merge bookkeeping below is deliberate.

use crate::types::Chunk;

pub const CHUNK_SIZE: usize = 500;
pub const CHUNK_OVERLAP: usize = 50;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self { chunk_size: CHUNK_SIZE, chunk_overlap: CHUNK_OVERLAP }
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_overlap < chunk_size, "overlap must be smaller than chunk size");
        Self { chunk_size, chunk_overlap }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Highest-priority separator that actually occurs in this window.
        let (sep, rest) = match separators.iter().position(|s| text.contains(s)) {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => return self.hard_cut(text),
        };

        let mut out = Vec::new();
        let mut mergeable: Vec<&str> = Vec::new();
        for piece in text.split(sep) {
            if char_len(piece) < self.chunk_size {
                mergeable.push(piece);
            } else {
                if !mergeable.is_empty() {
                    out.extend(self.merge(&mergeable, sep));
                    mergeable.clear();
                }
                if rest.is_empty() {
                    out.extend(self.hard_cut(piece));
                } else {
                    out.extend(self.split_with(piece, rest));
                }
            }
        }
        if !mergeable.is_empty() {
            out.extend(self.merge(&mergeable, sep));
        }
        out
    }

    /// Greedily re-join split pieces with their separator up to `chunk_size`.
    /// When a window fills, pieces are dropped from the front until at most
    /// `chunk_overlap` characters remain; those leftovers start the next
    /// window, which is what preserves cross-boundary context.
    fn merge(&self, pieces: &[&str], sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);
        let mut docs = Vec::new();
        let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let join_cost = if window.is_empty() { 0 } else { sep_len };
            if total + piece_len + join_cost > self.chunk_size && !window.is_empty() {
                if let Some(doc) = join_window(&window, sep) {
                    docs.push(doc);
                }
                // Shrink the window down to the overlap budget (and far enough
                // that the incoming piece fits).
                while total > self.chunk_overlap
                    || (total + piece_len + if window.is_empty() { 0 } else { sep_len }
                        > self.chunk_size
                        && total > 0)
                {
                    let lead_cost = if window.len() > 1 { sep_len } else { 0 };
                    match window.pop_front() {
                        Some(front) => total -= char_len(front) + lead_cost,
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += piece_len + if window.len() > 1 { sep_len } else { 0 };
        }
        if let Some(doc) = join_window(&window, sep) {
            docs.push(doc);
        }
        docs
    }

    /// Last resort for separator-free text: fixed windows of `chunk_size`
    /// characters advancing by `chunk_size - chunk_overlap`.
    fn hard_cut(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let stride = self.chunk_size - self.chunk_overlap;
        let mut out = Vec::new();
        let mut start = 0usize;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        out
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_window(window: &std::collections::VecDeque<&str>, sep: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(sep);
    let trimmed = joined.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Split a document's full text into chunks tagged with their source.
pub fn chunk_document(text: &str, source: &str) -> Vec<Chunk> {
    TextSplitter::default()
        .split(text)
        .into_iter()
        .map(|content| Chunk::new(content, source))
        .collect()
}
