//! Flat vector store over LanceDB.
//!
//! One row per chunk: explicit id, source, content, collection position and
//! the embedding vector. Carrying the payload on the row (instead of joining
//! an index position against a parallel metadata array) means a search hit is
//! self-describing.

pub mod schema;
pub mod search;
pub mod writer;

pub use search::ChunkSearchEngine;
pub use writer::ChunkIndexer;
