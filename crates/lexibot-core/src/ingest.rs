//! Batch ingestion: raw PDF directory -> chunk collection.
//!
//! The chunk collection JSON is the single durable record of chunk metadata;
//! it is written atomically (temp file + rename) so a failed run never leaves
//! a half-written collection behind.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::TextSplitter;
use crate::extract::extract_pdf_text;
use crate::types::Chunk;

#[derive(Default)]
pub struct DocumentProcessor {
    splitter: TextSplitter,
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_splitter(splitter: TextSplitter) -> Self {
        Self { splitter }
    }

    /// Extract and chunk every PDF under `raw_dir`, in stable (sorted) file
    /// order. A file that fails extraction aborts the batch with its
    /// diagnostic; an empty directory yields an empty collection.
    pub fn process_directory(&self, raw_dir: &Path) -> Result<Vec<Chunk>> {
        let files = list_pdf_files(raw_dir);
        if files.is_empty() {
            tracing::warn!("No .pdf files found under {}", raw_dir.display());
            return Ok(vec![]);
        }

        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::info!(
                "Processing file {}/{}: {}",
                file_index + 1,
                files.len(),
                file_path.display()
            );
            let text = extract_pdf_text(file_path)?;
            let source = doc_stem(file_path);
            all_chunks.extend(
                self.splitter
                    .split(&text)
                    .into_iter()
                    .map(|content| Chunk::new(content, source.clone())),
            );
        }
        tracing::info!("Processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }
}

/// Persist the chunk collection as a JSON array of `{content, source}`.
/// Zero chunks still produce a valid (empty) collection file.
pub fn write_chunks(chunks: &[Chunk], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(chunks)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading chunk collection at {}", path.display()))?;
    let chunks = serde_json::from_str(&json)
        .with_context(|| format!("parsing chunk collection at {}", path.display()))?;
    Ok(chunks)
}

fn doc_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn list_pdf_files(root: &Path) -> Vec<PathBuf> {
    let mut pdf_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("pdf"))
        .collect();
    pdf_files.sort();
    pdf_files
}
