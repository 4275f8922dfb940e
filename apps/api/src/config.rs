use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fields::Variant;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    /// Variant used when a request does not pass `?variant=`.
    pub default_variant: Variant,
    /// Directory holding `model.onnx`, `tokenizer.json` and `config.json`.
    /// Unset means the entity variant runs without a model.
    pub ner_model_dir: Option<PathBuf>,
    pub tesseract_path: String,
    pub ocr_language: String,
    pub ocr_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            default_variant: parse_env("DEFAULT_VARIANT", Variant::Entity)
                .context("DEFAULT_VARIANT must be 'entity' or 'regex'")?,
            ner_model_dir: std::env::var("NER_MODEL_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            tesseract_path: std::env::var("TESSERACT_PATH")
                .unwrap_or_else(|_| "tesseract".to_string()),
            ocr_language: std::env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
            ocr_timeout: Duration::from_secs(
                parse_env("OCR_TIMEOUT_SECS", 60u64)
                    .context("OCR_TIMEOUT_SECS must be a number of seconds")?,
            ),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_variant: Variant::Entity,
            ner_model_dir: None,
            tesseract_path: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            ocr_timeout: Duration::from_secs(60),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}")),
        Err(_) => Ok(default),
    }
}
