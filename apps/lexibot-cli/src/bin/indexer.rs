use std::{env, fs, path::PathBuf};

use lexibot_core::config::Config;
use lexibot_core::ingest::load_chunks;
use lexibot_embed::get_default_embedder;
use lexibot_vector::schema::CHUNKS_TABLE;
use lexibot_vector::ChunkIndexer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::load()?;
    let processed_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.path_or("data.processed_path", "data/processed/legal_chunks.json"));
    let lancedb_dir = config.path_or("data.lancedb_dir", "data/vector_store");
    let embed_dir = config.path_or("models.embed_dir", "models/all-MiniLM-L6-v2");

    println!("LexiBot indexer\n===============");
    println!("Chunk collection: {}", processed_path.display());
    println!("Vector store: {}", lancedb_dir.display());

    let chunks = load_chunks(&processed_path)?;
    if chunks.is_empty() {
        return Err(lexibot_core::error::Error::IndexBuild(format!(
            "chunk collection at {} is empty; refusing to build an index (run lexibot-ingest on a non-empty directory first)",
            processed_path.display()
        ))
        .into());
    }

    let embedder = get_default_embedder(&embed_dir)?;
    println!("Embedding {} chunks...", chunks.len());
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts)?;

    // A rebuild fully replaces the previous store.
    if lancedb_dir.exists() {
        fs::remove_dir_all(&lancedb_dir)?;
    }
    fs::create_dir_all(&lancedb_dir)?;

    let indexer = ChunkIndexer::new(&lancedb_dir, CHUNKS_TABLE).await?;
    indexer.index(&chunks, &embeddings).await?;

    println!("Indexed {} chunks into {}", chunks.len(), lancedb_dir.display());
    Ok(())
}
