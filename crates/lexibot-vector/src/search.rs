use anyhow::{anyhow, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::path::Path;

use arrow_array::{Float32Array, StringArray};

use lexibot_core::types::RetrievedChunk;

/// Read side of the flat store. Exhaustive L2 search; no ANN structure is
/// ever built, so every query scans all vectors and results are exact.
pub struct ChunkSearchEngine {
    db: Connection,
    table_name: String,
}

impl std::fmt::Debug for ChunkSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkSearchEngine")
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

impl ChunkSearchEngine {
    /// Open an existing store. A missing table is a startup error; the
    /// service must not come up without an index.
    pub async fn open(db_path: &Path, table_name: &str) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        let names = db.table_names().execute().await?;
        if !names.contains(&table_name.to_string()) {
            return Err(anyhow!(
                "vector table '{}' not found at {} (run the indexer first)",
                table_name,
                db_path.display()
            ));
        }
        Ok(Self { db, table_name: table_name.to_string() })
    }

    /// Number of indexed chunks.
    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    /// Top-`k` nearest chunks to `query_vec` by L2 distance, nearest first.
    /// Asking for more rows than the table holds just returns the whole
    /// table in distance order.
    pub async fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(query_vec.to_vec())?
            .distance_type(DistanceType::L2)
            .limit(k)
            .execute()
            .await?;

        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_column(&batch, "id")?;
            let sources = string_column(&batch, "source")?;
            let contents = string_column(&batch, "content")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>().cloned())
                .ok_or_else(|| anyhow!("search result is missing the _distance column"))?;
            for i in 0..batch.num_rows() {
                hits.push(RetrievedChunk {
                    id: ids.value(i).to_string(),
                    source: sources.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    distance: distances.value(i),
                });
            }
        }
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}

fn string_column(batch: &arrow_array::RecordBatch, name: &str) -> Result<StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>().cloned())
        .ok_or_else(|| anyhow!("search result is missing the {name} column"))
}
