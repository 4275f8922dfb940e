//! Text extraction: dispatches an uploaded document to its format decoder.
//!
//! PDF, DOCX and image decoding are CPU-bound and run on the blocking pool.
//! OCR goes through the pluggable `OcrEngine` held by `TextExtractor`.

pub mod docx;
pub mod ocr;
pub mod pdf;

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::errors::ExtractError;
use crate::models::document::{Document, DocumentFormat};

pub use ocr::{OcrEngine, TesseractOcr};

/// Turns a `Document` into a single text blob.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        TextExtractor { ocr }
    }

    /// Extracted text or the reason there is none; never both.
    pub async fn extract(&self, document: &Document) -> Result<String, ExtractError> {
        let format = document.format();
        debug!(
            "Extracting {} ({format}, {} bytes)",
            document.file_name(),
            document.size_bytes()
        );

        let text = match format {
            DocumentFormat::Pdf => {
                run_blocking(document.content().clone(), |b| pdf::extract_pdf_text(&b)).await?
            }
            DocumentFormat::Docx => {
                run_blocking(document.content().clone(), |b| docx::extract_docx_text(&b)).await?
            }
            DocumentFormat::Txt => decode_utf8(document.content())?,
            DocumentFormat::Jpg | DocumentFormat::Jpeg | DocumentFormat::Png => {
                self.extract_image_text(document.content().clone()).await?
            }
        };

        info!(
            "Extracted {} chars from {}",
            text.chars().count(),
            document.file_name()
        );
        Ok(text)
    }

    /// OCR fragments joined by a single space.
    async fn extract_image_text(&self, content: Bytes) -> Result<String, ExtractError> {
        let image = run_blocking(content, |b| {
            image::load_from_memory(&b)
                .map_err(|e| ExtractError::Extraction(format!("failed to decode image: {e}")))
        })
        .await?;
        let fragments = self.ocr.recognize(&image).await?;
        Ok(fragments.join(" "))
    }
}

fn decode_utf8(content: &Bytes) -> Result<String, ExtractError> {
    Ok(String::from_utf8(content.to_vec())?)
}

async fn run_blocking<T, F>(content: Bytes, decode: F) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce(Bytes) -> Result<T, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode(content))
        .await
        .map_err(|e| ExtractError::Extraction(format!("decoder task failed: {e}")))?
}
