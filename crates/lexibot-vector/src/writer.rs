use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};

use crate::schema::{build_arrow_schema, EMBEDDING_DIM};
use lexibot_core::error::Error;
use lexibot_core::types::Chunk;

pub struct ChunkIndexer {
    pub(crate) db: Connection,
    pub(crate) table_name: String,
}

impl ChunkIndexer {
    pub async fn new(db_path: &Path, table_name: &str) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string() })
    }

    /// Write chunks and their embeddings, one row per chunk, in collection
    /// order. An empty collection is refused: it would otherwise produce a
    /// useless index that only fails later, at query time.
    pub async fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() {
            return Err(Error::IndexBuild(
                "refusing to build a vector index from zero chunks".to_string(),
            )
            .into());
        }
        if chunks.len() != embeddings.len() {
            return Err(Error::IndexBuild(format!(
                "chunk/embedding count mismatch: {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            ))
            .into());
        }
        tracing::info!("Indexing {} chunks into table '{}'", chunks.len(), self.table_name);

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        let batch_size = 1000usize;
        for (batch_start, batch) in chunks.chunks(batch_size).enumerate().map(|(i, b)| (i * batch_size, b)) {
            let vecs = &embeddings[batch_start..batch_start + batch.len()];
            let record_batch = rows_to_record_batch(batch, vecs, batch_start)?;
            self.insert_batch(record_batch).await?;
            pb.set_position((batch_start + batch.len()) as u64);
        }
        pb.finish_with_message("indexing complete");
        tracing::info!("Indexed {} chunks", chunks.len());
        Ok(())
    }

    async fn insert_batch(&self, record_batch: RecordBatch) -> Result<()> {
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.db.table_names().execute().await?.contains(&self.table_name) {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }
}

fn rows_to_record_batch(
    chunks: &[Chunk],
    embeddings: &[Vec<f32>],
    first_position: usize,
) -> Result<RecordBatch> {
    let schema = build_arrow_schema();
    let mut ids = Vec::new();
    let mut sources = Vec::new();
    let mut contents = Vec::new();
    let mut positions = Vec::new();
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
    for (offset, (chunk, vector)) in chunks.iter().zip(embeddings.iter()).enumerate() {
        let position = first_position + offset;
        ids.push(format!("{}:{}", chunk.source, position));
        sources.push(chunk.source.clone());
        contents.push(chunk.content.clone());
        positions.push(position as i32);
        vectors.push(Some(vector.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int32Array::from(positions)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                vectors.into_iter(),
                EMBEDDING_DIM,
            )),
        ],
    )?;
    Ok(record_batch)
}
