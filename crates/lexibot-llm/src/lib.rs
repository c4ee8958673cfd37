//! Local text generation from a GGUF model.
//!
//! Wraps candle's quantized llama weights behind the `Generator` trait.
//! Inference is serialized behind a mutex: generation is a blocking,
//! compute-bound call and concurrent requests queue behind it. Once a
//! generation has started it cannot be cancelled.
//!
//! `APP_USE_FAKE_GENERATOR=1` swaps in a deterministic stub so the service
//! and its tests never need model weights.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Mutex;

use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use tokenizers::Tokenizer;

use lexibot_core::traits::Generator;
use lexibot_embed::select_device;

#[derive(Debug, Clone)]
pub struct GenConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub seed: u64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self { temperature: 0.7, top_p: 0.9, seed: 299792458 }
    }
}

pub struct TextGenerator {
    model: Mutex<ModelWeights>,
    tokenizer: Tokenizer,
    device: Device,
    config: GenConfig,
    eos_token: Option<u32>,
}

impl TextGenerator {
    /// Load GGUF weights and the tokenizer. Both paths must resolve or the
    /// service fails to initialize.
    pub fn load(model_path: &Path, tokenizer_path: &Path, config: GenConfig) -> Result<Self> {
        let device = select_device();
        tracing::info!("Loading GGUF model from {}", model_path.display());

        let mut file = std::fs::File::open(model_path)
            .with_context(|| format!("opening GGUF weights at {}", model_path.display()))?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| e.with_path(model_path))
            .context("reading GGUF content")?;
        let model = ModelWeights::from_gguf(content, &mut file, &device)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let eos_token = ["</s>", "<|im_end|>", "<|endoftext|>"]
            .iter()
            .find_map(|t| tokenizer.token_to_id(t));

        Ok(Self { model: Mutex::new(model), tokenizer, device, config, eos_token })
    }

    fn complete(&self, prompt: &str, max_tokens: usize, stop: &[String]) -> Result<String> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("generator mutex poisoned"))?;

        let prompt_tokens = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?
            .get_ids()
            .to_vec();
        if prompt_tokens.is_empty() {
            anyhow::bail!("empty prompt after tokenization");
        }

        let mut logits_processor = LogitsProcessor::new(
            self.config.seed,
            Some(self.config.temperature),
            Some(self.config.top_p),
        );

        // Prefill the whole prompt in one forward pass, then decode token by token.
        let input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let logits = model.forward(&input, 0)?.squeeze(0)?;
        let mut next = logits_processor.sample(&logits)?;

        let mut generated: Vec<u32> = Vec::new();
        for index in 0..max_tokens {
            if Some(next) == self.eos_token {
                break;
            }
            generated.push(next);

            let text_so_far = self
                .tokenizer
                .decode(&generated, true)
                .map_err(|e| anyhow!("Detokenization failed: {}", e))?;
            if find_stop(&text_so_far, stop).is_some() {
                break;
            }

            let input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
            let logits = model
                .forward(&input, prompt_tokens.len() + index)?
                .squeeze(0)?;
            next = logits_processor.sample(&logits)?;
        }

        let output = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("Detokenization failed: {}", e))?;
        Ok(truncate_at_stop(&output, stop).trim().to_string())
    }
}

impl Generator for TextGenerator {
    fn generate(&self, prompt: &str, max_tokens: usize, stop: &[String]) -> Result<String> {
        self.complete(prompt, max_tokens, stop)
    }
}

fn find_stop(text: &str, stop: &[String]) -> Option<usize> {
    stop.iter().filter_map(|s| text.find(s.as_str())).min()
}

/// Cut `text` at the earliest stop sequence, if any.
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[String]) -> &'a str {
    match find_stop(text, stop) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Deterministic stub used in tests and development: answers with the
/// question it finds in the prompt, so callers can assert the prompt was
/// assembled correctly.
pub struct FakeGenerator;

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str, _max_tokens: usize, stop: &[String]) -> Result<String> {
        let question = prompt
            .rsplit("Question:")
            .next()
            .and_then(|rest| rest.split("Answer:").next())
            .unwrap_or(prompt)
            .trim();
        let answer = format!("Stub answer about: {question}");
        Ok(truncate_at_stop(&answer, stop).trim().to_string())
    }
}

/// Resolve the generator: the stub when `APP_USE_FAKE_GENERATOR=1`,
/// otherwise the GGUF model at the configured paths.
pub fn get_default_generator(
    model_path: &Path,
    tokenizer_path: &Path,
    config: GenConfig,
) -> Result<Box<dyn Generator>> {
    let use_fake = std::env::var("APP_USE_FAKE_GENERATOR")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("Using FakeGenerator (APP_USE_FAKE_GENERATOR)");
        return Ok(Box::new(FakeGenerator));
    }
    Ok(Box::new(TextGenerator::load(model_path, tokenizer_path, config)?))
}
