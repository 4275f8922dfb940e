//! Entity variant: buckets named entities into names / organizations /
//! locations / dates.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::ExtractError;
use crate::fields::{FieldExtractor, Variant};
use crate::models::fields::{EntityFields, FieldMap};

/// The four entity categories that make it into a `FieldMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Person,
    Organization,
    GeopoliticalPlace,
    Date,
}

impl EntityCategory {
    /// Maps a model label (`B-`/`I-` prefix allowed) to a category.
    /// Anything outside the four categories returns `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let kind = label
            .strip_prefix("B-")
            .or_else(|| label.strip_prefix("I-"))
            .unwrap_or(label);
        match kind.to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => Some(EntityCategory::Person),
            "ORG" => Some(EntityCategory::Organization),
            "GPE" => Some(EntityCategory::GeopoliticalPlace),
            "DATE" => Some(EntityCategory::Date),
            _ => None,
        }
    }
}

/// One recognized entity: the covered text and the raw model label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Entity {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// A loaded named-entity model. Read-only once constructed.
pub trait EntityRecognizer: Send + Sync {
    /// Entities in the order they occur in `text`.
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, ExtractError>;
}

/// Splits entities into the four buckets, keeping discovery order.
pub fn partition_entities(entities: Vec<Entity>) -> EntityFields {
    let mut fields = EntityFields::default();
    for entity in entities {
        match EntityCategory::from_label(&entity.label) {
            Some(EntityCategory::Person) => fields.names.push(entity.text),
            Some(EntityCategory::Organization) => fields.organizations.push(entity.text),
            Some(EntityCategory::GeopoliticalPlace) => fields.locations.push(entity.text),
            Some(EntityCategory::Date) => fields.dates.push(entity.text),
            None => debug!("Dropping entity {:?} with label {}", entity.text, entity.label),
        }
    }
    fields
}

/// Entity variant backed by a loaded model.
pub struct EntityFieldExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl EntityFieldExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        EntityFieldExtractor { recognizer }
    }
}

impl FieldExtractor for EntityFieldExtractor {
    fn variant(&self) -> Variant {
        Variant::Entity
    }

    fn extract_fields(&self, text: &str) -> Result<Option<FieldMap>, ExtractError> {
        let entities = self.recognizer.recognize(text)?;
        debug!("Recognized {} entities", entities.len());
        Ok(Some(FieldMap::Entities(partition_entities(entities))))
    }
}

/// Entity variant with no model loaded: text still flows, fields never do.
pub struct ModelUnavailableExtractor;

impl FieldExtractor for ModelUnavailableExtractor {
    fn variant(&self) -> Variant {
        Variant::Entity
    }

    fn extract_fields(&self, _text: &str) -> Result<Option<FieldMap>, ExtractError> {
        Ok(None)
    }

    fn produces_fields(&self) -> bool {
        false
    }
}

/// Picks the entity backend once, based on whether a model was loaded.
pub fn build_entity_extractor(
    recognizer: Option<Arc<dyn EntityRecognizer>>,
) -> Arc<dyn FieldExtractor> {
    match recognizer {
        Some(recognizer) => Arc::new(EntityFieldExtractor::new(recognizer)),
        None => {
            warn!("No entity model loaded; entity variant will return text without fields");
            Arc::new(ModelUnavailableExtractor)
        }
    }
}
