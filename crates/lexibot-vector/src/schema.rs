use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Must match the embedding model; see `lexibot_embed::EMBEDDING_DIM`.
pub const EMBEDDING_DIM: i32 = 384;

pub const CHUNKS_TABLE: &str = "chunks";

pub fn build_arrow_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("position", DataType::Int32, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIM,
            ),
            true,
        ),
    ]))
}
