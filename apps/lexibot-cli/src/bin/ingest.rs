use std::env;
use std::path::PathBuf;

use lexibot_core::config::Config;
use lexibot_core::ingest::{write_chunks, DocumentProcessor};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::load()?;
    let raw_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.path_or("data.raw_docs_dir", "data/raw_docs"));
    let processed_path = config.path_or("data.processed_path", "data/processed/legal_chunks.json");

    println!("Ingesting PDFs from {}", raw_dir.display());
    let processor = DocumentProcessor::new();
    let chunks = processor.process_directory(&raw_dir)?;

    write_chunks(&chunks, &processed_path)?;
    println!("Saved {} chunks to {}", chunks.len(), processed_path.display());
    Ok(())
}
