//! OCR backends for image uploads.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::process::Command;
use tracing::debug;

use crate::errors::ExtractError;

/// Optical character recognition over a decoded image.
///
/// Returns text fragments in the order the recognizer reports them.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, ExtractError>;
}

/// Runs the `tesseract` CLI and reads its TSV word table.
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, timeout: Duration) -> Self {
        TesseractOcr {
            binary: binary.into(),
            language: language.into(),
            timeout,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, ExtractError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractError::Extraction(format!("failed to encode image for OCR: {e}")))?;

        let input = tempfile::Builder::new()
            .prefix("resume-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractError::Extraction(format!("failed to create temp file: {e}")))?;
        tokio::fs::write(input.path(), &png)
            .await
            .map_err(|e| ExtractError::Extraction(format!("failed to write temp file: {e}")))?;

        let run = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                ExtractError::Extraction(format!(
                    "tesseract timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractError::Extraction(format!(
                        "tesseract not found at '{}'",
                        self.binary.display()
                    ))
                } else {
                    ExtractError::Extraction(format!("failed to run tesseract: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Extraction(format!(
                "tesseract exited with {code}: {}",
                stderr.trim()
            )));
        }

        let words = parse_tsv_words(&String::from_utf8_lossy(&output.stdout));
        debug!("tesseract recognized {} words", words.len());
        Ok(words)
    }
}

/// Word-level (`level == 5`) entries with non-blank text, in output order.
///
/// Columns: level page_num block_num par_num line_num word_num left top width
/// height conf text.
fn parse_tsv_words(tsv: &str) -> Vec<String> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let text = cols[11].trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}
