//! ONNX token-classification model for the entity variant.
//!
//! Expects a directory with `model.onnx`, `tokenizer.json` and a Hugging Face
//! style `config.json` carrying `id2label`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use crate::errors::ExtractError;
use crate::fields::entities::{Entity, EntityRecognizer};
use crate::fields::tagging::{decode_spans, fit_windows, TokenTag};

/// First cut for windows; dense windows are split again until they encode
/// within `MAX_TOKENS`.
const WINDOW_BYTES: usize = 1000;
const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

pub struct OnnxEntityRecognizer {
    /// `Session::run` needs `&mut`; the model itself never changes.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    uses_token_type_ids: bool,
}

impl OnnxEntityRecognizer {
    pub fn load(dir: &Path) -> Result<Self> {
        let model_path = dir.join("model.onnx");
        info!("Loading entity model from {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&model_path)?;
        let uses_token_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(dir.join("tokenizer.json"))
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer.json: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to configure truncation: {e}"))?;

        let raw = std::fs::read_to_string(dir.join("config.json"))
            .context("failed to read model config.json")?;
        let config: ModelConfig =
            serde_json::from_str(&raw).context("config.json has no usable id2label")?;
        let labels = labels_by_index(config.id2label)?;

        info!(
            "Entity model ready: {} labels, token_type_ids={}",
            labels.len(),
            uses_token_type_ids
        );

        Ok(OnnxEntityRecognizer {
            session: Mutex::new(session),
            tokenizer,
            labels,
            uses_token_type_ids,
        })
    }

    /// True when `window` encodes without truncation.
    fn fits_model(&self, window: &str) -> bool {
        match self.tokenizer.encode(window, true) {
            Ok(encoding) => encoding.get_overflowing().is_empty(),
            // Reported by `recognize_window`.
            Err(_) => true,
        }
    }

    fn recognize_window(&self, window: &str) -> Result<Vec<Entity>> {
        if window.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(window, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;
        if !encoding.get_overflowing().is_empty() {
            warn!(
                "Window of {} bytes exceeds {MAX_TOKENS} tokens; tail is truncated",
                window.len()
            );
        }
        let len = encoding.get_ids().len();
        let to_i64 = |values: &[u32]| -> Box<[i64]> { values.iter().map(|&v| v as i64).collect() };

        let input_ids = Value::from_array(([1_usize, len], to_i64(encoding.get_ids())))?;
        let attention_mask =
            Value::from_array(([1_usize, len], to_i64(encoding.get_attention_mask())))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("entity model lock poisoned"))?;
        let outputs = if self.uses_token_type_ids {
            let token_type_ids =
                Value::from_array(([1_usize, len], to_i64(encoding.get_type_ids())))?;
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])?
        } else {
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])?
        };

        let (shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let num_labels = shape.last().copied().unwrap_or(0) as usize;
        if num_labels == 0 || logits.len() < len * num_labels {
            anyhow::bail!("unexpected logits shape {:?}", shape);
        }

        let offsets = encoding.get_offsets();
        let word_ids = encoding.get_word_ids();
        let special = encoding.get_special_tokens_mask();
        let tags: Vec<TokenTag<'_>> = (0..len)
            .map(|i| {
                let row = &logits[i * num_labels..(i + 1) * num_labels];
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                TokenTag {
                    label: self.labels.get(best).map(String::as_str).unwrap_or("O"),
                    offsets: offsets[i],
                    word_id: word_ids[i],
                    special: special[i] == 1,
                }
            })
            .collect();

        Ok(decode_spans(window, &tags))
    }
}

impl EntityRecognizer for OnnxEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
        let mut entities = Vec::new();
        for (offset, window) in fit_windows(text, WINDOW_BYTES, |w| self.fits_model(w)) {
            let found = self
                .recognize_window(window)
                .map_err(|e| ExtractError::Extraction(format!("entity model failed: {e}")))?;
            debug!("Window at byte {offset}: {} entities", found.len());
            entities.extend(found);
        }
        Ok(entities)
    }
}

/// `{"0": "O", "1": "B-PER", ...}` → `["O", "B-PER", ...]`.
fn labels_by_index(id2label: HashMap<String, String>) -> Result<Vec<String>> {
    let mut labels = vec!["O".to_string(); id2label.len()];
    for (id, label) in id2label {
        let idx: usize = id
            .parse()
            .with_context(|| format!("id2label key '{id}' is not an index"))?;
        let slot = labels
            .get_mut(idx)
            .with_context(|| format!("id2label index {idx} out of range"))?;
        *slot = label;
    }
    Ok(labels)
}
