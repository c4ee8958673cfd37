//! PDF text extraction via the `pdftotext` command.
//!
//! Output keeps one newline-terminated segment per page (pdftotext emits a
//! form feed between pages); pages that yield no text are skipped. A corrupt
//! or unreadable file fails that file's run with a diagnostic rather than
//! being silently dropped.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

const PAGE_BREAK: char = '\u{000C}';

pub fn extract_pdf_text(pdf_path: &Path) -> Result<String> {
    tracing::info!("Extracting text from {}", pdf_path.display());

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(pdf_path)
        .arg("-")
        .output()
        .map_err(|e| Error::Ingest {
            file: pdf_path.display().to_string(),
            reason: format!("pdftotext is unavailable: {e}"),
        })?;

    if !output.status.success() {
        return Err(Error::Ingest {
            file: pdf_path.display().to_string(),
            reason: format!(
                "pdftotext exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(concat_pages(&text))
}

fn concat_pages(raw: &str) -> String {
    let mut full_text = String::new();
    for page in raw.split(PAGE_BREAK) {
        let trimmed = page.trim();
        if trimmed.is_empty() {
            continue;
        }
        full_text.push_str(trimmed);
        full_text.push('\n');
    }
    full_text
}
