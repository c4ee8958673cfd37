use lexibot_core::error::{Error, Result};
use lexibot_core::traits::{Embedder, Generator};
use lexibot_vector::ChunkSearchEngine;

pub const DEFAULT_TOP_K: usize = 3;
pub const MAX_GEN_TOKENS: usize = 512;

/// Stop strings that keep the model from hallucinating a new dialogue turn.
pub fn stop_sequences() -> Vec<String> {
    vec!["User:".to_string(), "Question:".to_string()]
}

/// The answer to one question, with the chunks that grounded it in the same
/// order they appeared in the prompt.
#[derive(Debug, Clone)]
pub struct Answer {
    pub query: String,
    pub answer: String,
    pub context: Vec<String>,
}

/// Long-lived, read-only request handler. Holds the search engine, the
/// embedding model and the generative model for the life of the process;
/// nothing here is mutated while serving.
pub struct QueryService {
    engine: ChunkSearchEngine,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    index_size: usize,
}

impl QueryService {
    /// The index size is pinned at startup; the store is immutable while
    /// serving, so requests can clamp `top_k` against it without re-counting.
    pub async fn new(
        engine: ChunkSearchEngine,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
    ) -> Result<Self> {
        let index_size = engine
            .count()
            .await
            .map_err(|e| Error::Startup(format!("cannot count indexed chunks: {e}")))?;
        if index_size == 0 {
            return Err(Error::Startup("vector store holds zero chunks".to_string()));
        }
        tracing::info!("Query service ready over {index_size} indexed chunks");
        Ok(Self { engine, embedder, generator, index_size })
    }

    pub fn index_size(&self) -> usize {
        self.index_size
    }

    /// Answer one question. Validation happens before any embedding or model
    /// work; `top_k` beyond the index size is clamped, not an error.
    pub async fn ask(&self, query: &str, top_k: usize) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(Error::BadRequest("query must not be empty".to_string()));
        }
        if top_k == 0 {
            return Err(Error::BadRequest("top_k must be a positive integer".to_string()));
        }
        let k = top_k.min(self.index_size);

        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::Internal(format!("query embedding failed: {e}")))?
            .remove(0);
        let hits = self
            .engine
            .search_vec(&query_vec, k)
            .await
            .map_err(|e| Error::Internal(format!("vector search failed: {e}")))?;
        let context: Vec<String> = hits.into_iter().map(|h| h.content).collect();

        let prompt = build_prompt(&context, query);
        let answer = self
            .generator
            .generate(&prompt, MAX_GEN_TOKENS, &stop_sequences())
            .map_err(|e| Error::Generation(e.to_string()))?;

        Ok(Answer { query: query.to_string(), answer, context })
    }
}

/// Instruction preamble, labeled context, labeled question, and the
/// "Answer:" completion cue. Chunks are joined with blank lines so the
/// model sees distinct passages.
pub fn build_prompt(context_chunks: &[String], query: &str) -> String {
    let context = context_chunks.join("\n\n");
    format!(
        "Answer the following question based on the provided Malaysian employment law context:\n\n\
         Context:\n{context}\n\n\
         Question:\n{query}\n\n\
         Answer:"
    )
}
