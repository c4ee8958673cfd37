//! Domain types shared by the ingestion pipeline and the query service.

use serde::{Deserialize, Serialize};

/// A bounded span of statute text, the atomic unit of retrieval.
///
/// Serialized exactly as `{"content": ..., "source": ...}` in the processed
/// chunk collection, which is the durable record the vector store is built
/// from. `source` is the stem of the originating document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
}

impl Chunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self { content: content.into(), source: source.into() }
    }
}

/// A chunk returned by nearest-neighbor search, nearest first.
///
/// `distance` is the L2 distance between the query embedding and the chunk
/// embedding; lower is closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub source: String,
    pub content: String,
    pub distance: f32,
}
