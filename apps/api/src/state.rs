use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::fields::FieldExtractors;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Format dispatch plus the OCR engine for image uploads.
    pub text_extractor: TextExtractor,
    /// One field extractor per variant; the entity one may be model-less.
    pub field_extractors: FieldExtractors,
}
