//! Sentence embedding for retrieval.
//!
//! The real backend is `all-MiniLM-L6-v2` (BERT, 384 dims) run through
//! candle with masked mean pooling and L2 normalization. The index and the
//! query side must use the same model; vectors from different models are not
//! comparable, so the model directory is fixed configuration.
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` swaps in a deterministic hash-bucket embedder
//! so tests and development never need the model weights.

use anyhow::{anyhow, Result};
use std::path::Path;

use candle_core::{DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use lexibot_core::traits::Embedder;

mod device;
mod pool;

pub use device::select_device;
pub use pool::masked_mean_l2;

/// Embedding dimensionality of the reference model (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Token budget per input; longer inputs are truncated.
const MAX_TOKENS: usize = 256;

pub struct EmbeddingModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: candle_core::Device,
}

impl EmbeddingModel {
    /// Load tokenizer, config and safetensors weights from `model_dir`.
    /// Missing artifacts are a startup error; the service must not come up
    /// without a resolvable embedding model.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!("Loading embedding model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self { model, tokenizer, device })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > MAX_TOKENS {
            ids.truncate(MAX_TOKENS);
            mask.truncate(MAX_TOKENS);
        }
        let len = ids.len();

        let input_ids = Tensor::from_iter(ids, &self.device)?.reshape((1, len))?;
        let attention_mask = Tensor::from_iter(mask, &self.device)?.reshape((1, len))?;
        let token_type_ids = Tensor::zeros((1, len), DType::U32, &self.device)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let embedding: Vec<f32> = pooled
            .to_device(&candle_core::Device::Cpu)?
            .squeeze(0)?
            .to_vec1()?;
        if embedding.len() != EMBEDDING_DIM {
            return Err(anyhow!(
                "Model produced {}-dim embeddings, expected {}",
                embedding.len(),
                EMBEDDING_DIM
            ));
        }
        Ok(embedding)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

/// Deterministic bag-of-words embedder for tests: each normalized token adds
/// weight to one hash bucket, and the vector is L2-normalized. Identical text
/// always embeds to the identical vector, so exact-text retrieval returns
/// distance zero.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let mut v = vec![0f32; self.dim];
            for token in text.split_whitespace() {
                let token: String = token
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase();
                if token.is_empty() {
                    continue;
                }
                let mut hasher = XxHash64::with_seed(0);
                token.hash(&mut hasher);
                v[(hasher.finish() as usize) % self.dim] += 1.0;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
            for x in &mut v {
                *x /= norm;
            }
            out.push(v);
        }
        Ok(out)
    }
}

/// Resolve the embedder: the fake one when `APP_USE_FAKE_EMBEDDINGS=1`,
/// otherwise the real model loaded from `model_dir`.
pub fn get_default_embedder(model_dir: &Path) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("Using FakeEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(EmbeddingModel::load(model_dir)?))
}
