//! Field maps and the JSON records built from them.
//!
//! Both field sets are plain structs, so every key is always present and an
//! absent match serializes as `[]`.

use serde::{Deserialize, Serialize};

use crate::fields::Variant;
use crate::models::document::DocumentFormat;

/// Buckets filled by the named-entity recognizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFields {
    pub names: Vec<String>,
    pub organizations: Vec<String>,
    pub locations: Vec<String>,
    pub dates: Vec<String>,
}

/// Matches collected by the fixed regex set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFields {
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub skills: Vec<String>,
}

/// Field key → matched fragments, one fixed key set per variant.
///
/// The variant tag doubles as the key under which the map is exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldMap {
    #[serde(rename = "extracted_entities")]
    Entities(EntityFields),
    #[serde(rename = "extracted_info")]
    Patterns(PatternFields),
}

impl FieldMap {
    pub fn variant(&self) -> Variant {
        match self {
            FieldMap::Entities(_) => Variant::Entity,
            FieldMap::Patterns(_) => Variant::Pattern,
        }
    }

    /// Total number of fragments across all keys.
    pub fn match_count(&self) -> usize {
        match self {
            FieldMap::Entities(f) => {
                f.names.len() + f.organizations.len() + f.locations.len() + f.dates.len()
            }
            FieldMap::Patterns(f) => {
                f.email.len()
                    + f.phone.len()
                    + f.education.len()
                    + f.experience.len()
                    + f.skills.len()
            }
        }
    }
}

/// The downloadable record: `{file_name, extracted_*, full_text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub file_name: String,
    #[serde(flatten)]
    pub fields: FieldMap,
    pub full_text: String,
}

impl ExportPayload {
    pub fn new(file_name: impl Into<String>, fields: FieldMap, full_text: impl Into<String>) -> Self {
        ExportPayload {
            file_name: file_name.into(),
            fields,
            full_text: full_text.into(),
        }
    }

    /// Pretty JSON with 2-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Name of the export download for an uploaded file.
pub fn export_file_name(original: &str) -> String {
    format!("resume_data_{original}.json")
}

/// Result of parsing one upload, returned by the parse endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedResume {
    pub file_name: String,
    pub file_type: DocumentFormat,
    pub size_bytes: usize,
    pub variant: Variant,
    pub full_text: String,
    /// `None` when the entity model is unavailable.
    pub fields: Option<FieldMap>,
}
