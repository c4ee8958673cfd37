use std::sync::Arc;

use lexibot_core::config::Config;
use lexibot_embed::get_default_embedder;
use lexibot_llm::{get_default_generator, GenConfig};
use lexibot_service::{router, AppState, QueryService};
use lexibot_vector::schema::CHUNKS_TABLE;
use lexibot_vector::ChunkSearchEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::load()?;
    let lancedb_dir = config.path_or("data.lancedb_dir", "data/vector_store");
    let embed_dir = config.path_or("models.embed_dir", "models/all-MiniLM-L6-v2");
    let llm_path = config.path_or("models.llm_path", "models/model.gguf");
    let llm_tokenizer = config.path_or("models.llm_tokenizer", "models/tokenizer.json");
    let addr: String = config.get_or("server.addr", "127.0.0.1:8000".to_string());

    // All of this must resolve before we accept a single request.
    let engine = ChunkSearchEngine::open(&lancedb_dir, CHUNKS_TABLE).await?;
    let embedder = get_default_embedder(&embed_dir)?;
    let generator = get_default_generator(&llm_path, &llm_tokenizer, GenConfig::default())?;
    let service = QueryService::new(engine, embedder, generator).await?;

    let app = router(AppState { service: Arc::new(service) });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
