//! Pattern variant: a fixed regex set, no model dependency.
//!
//! Keyword patterns run from the keyword to the nearest following `.`, so a
//! keyword with no later period yields nothing and a long unpunctuated run is
//! captured whole. Kept as-is; callers rely on the exact spans.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ExtractError;
use crate::fields::{FieldExtractor, Variant};
use crate::models::fields::{FieldMap, PatternFields};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

static EDUCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:education|qualification|degree|bachelor|master|phd)\b[^.]*\.").unwrap()
});

static EXPERIENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:experience|work|employment)\b[^.]*\.").unwrap());

static SKILLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:skills|expertise|proficiency)\b[^.]*\.").unwrap());

/// All non-overlapping matches in order of appearance, trimmed.
fn collect_matches(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Runs every pattern independently over the full text.
pub fn extract_pattern_fields(text: &str) -> PatternFields {
    PatternFields {
        email: collect_matches(&EMAIL, text),
        phone: collect_matches(&PHONE, text),
        education: collect_matches(&EDUCATION, text),
        experience: collect_matches(&EXPERIENCE, text),
        skills: collect_matches(&SKILLS, text),
    }
}

pub struct PatternFieldExtractor;

impl FieldExtractor for PatternFieldExtractor {
    fn variant(&self) -> Variant {
        Variant::Pattern
    }

    fn extract_fields(&self, text: &str) -> Result<Option<FieldMap>, ExtractError> {
        Ok(Some(FieldMap::Patterns(extract_pattern_fields(text))))
    }
}
