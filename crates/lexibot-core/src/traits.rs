/// Sentence embedding backend. Implementations must be interchangeable only
/// when they share the same underlying model; vectors from different models
/// are not comparable.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Local text generation backend.
///
/// `stop` sequences terminate generation early; the matched sequence is not
/// included in the returned completion.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str, max_tokens: usize, stop: &[String]) -> anyhow::Result<String>;
}
