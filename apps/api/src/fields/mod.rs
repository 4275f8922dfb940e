//! Field extraction: turns extracted text into a fixed-key `FieldMap`.
//!
//! Two backends sit behind the `FieldExtractor` trait:
//! - `PatternFieldExtractor`: five fixed regexes, no external model.
//! - `EntityFieldExtractor`: pretrained named-entity recognizer.
//!
//! Whether an entity model exists is decided once, in `build_entity_extractor`.
//! `AppState` holds one `Arc<dyn FieldExtractor>` per variant.

pub mod entities;
#[cfg(feature = "ner")]
pub mod onnx;
pub mod patterns;
pub mod tagging;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::errors::ExtractError;
use crate::models::document::DocumentFormat;
use crate::models::fields::FieldMap;

pub use entities::{build_entity_extractor, EntityRecognizer};
pub use patterns::PatternFieldExtractor;

/// Which extraction path a request runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variant {
    #[serde(rename = "entity")]
    Entity,
    #[serde(rename = "regex")]
    Pattern,
}

impl Variant {
    /// Upload formats this variant accepts.
    pub fn accepts(self, format: DocumentFormat) -> bool {
        match self {
            Variant::Entity => true,
            Variant::Pattern => !format.is_image(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Entity => "entity",
            Variant::Pattern => "regex",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entity" | "entities" | "ner" => Ok(Variant::Entity),
            "regex" | "pattern" | "patterns" => Ok(Variant::Pattern),
            other => Err(format!("unknown variant '{other}'")),
        }
    }
}

/// A field extraction backend.
///
/// `Ok(None)` means "no structured data available" (entity variant without a
/// model); it is not an error.
pub trait FieldExtractor: Send + Sync {
    fn variant(&self) -> Variant;

    fn extract_fields(&self, text: &str) -> Result<Option<FieldMap>, ExtractError>;

    /// False only for the entity variant running without a model.
    fn produces_fields(&self) -> bool {
        true
    }
}

/// One extractor per variant, built at startup.
#[derive(Clone)]
pub struct FieldExtractors {
    pub entity: Arc<dyn FieldExtractor>,
    pub pattern: Arc<dyn FieldExtractor>,
}

impl FieldExtractors {
    pub fn new(recognizer: Option<Arc<dyn EntityRecognizer>>) -> Self {
        FieldExtractors {
            entity: build_entity_extractor(recognizer),
            pattern: Arc::new(PatternFieldExtractor),
        }
    }

    pub fn for_variant(&self, variant: Variant) -> &Arc<dyn FieldExtractor> {
        match variant {
            Variant::Entity => &self.entity,
            Variant::Pattern => &self.pattern,
        }
    }
}

/// Loads the entity model once at startup. Any failure leaves the entity
/// variant without a model rather than stopping the service.
pub fn load_entity_model(dir: Option<&Path>) -> Option<Arc<dyn EntityRecognizer>> {
    let dir = dir?;

    #[cfg(feature = "ner")]
    {
        match onnx::OnnxEntityRecognizer::load(dir) {
            Ok(recognizer) => Some(Arc::new(recognizer)),
            Err(e) => {
                warn!("Failed to load entity model from {}: {e:#}", dir.display());
                None
            }
        }
    }

    #[cfg(not(feature = "ner"))]
    {
        warn!(
            "NER_MODEL_DIR={} is set but this build lacks the `ner` feature",
            dir.display()
        );
        None
    }
}
