use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::ExtractError;
use crate::extraction::TextExtractor;
use crate::fields::{FieldExtractor, Variant};
use crate::models::document::Document;
use crate::models::fields::{ExportPayload, ParsedResume};

/// Runs one upload through text extraction and the variant's field extractor.
///
/// Uploads are independent; nothing here outlives the call.
pub async fn parse_document(
    document: &Document,
    text_extractor: &TextExtractor,
    field_extractor: Arc<dyn FieldExtractor>,
) -> Result<ParsedResume, ExtractError> {
    let variant = field_extractor.variant();
    if !variant.accepts(document.format()) {
        return Err(ExtractError::UnsupportedFormat(
            document.format().extension().to_string(),
        ));
    }

    let full_text = text_extractor.extract(document).await?;

    let fields = {
        let text = full_text.clone();
        tokio::task::spawn_blocking(move || field_extractor.extract_fields(&text))
            .await
            .map_err(|e| ExtractError::Extraction(format!("field extraction task failed: {e}")))??
    };

    match &fields {
        Some(map) => info!(
            "{} ({variant}): {} field matches",
            document.file_name(),
            map.match_count()
        ),
        None => info!(
            "{} ({variant}): no entity model, returning text only",
            document.file_name()
        ),
    }

    Ok(ParsedResume {
        file_name: document.file_name().to_string(),
        file_type: document.format(),
        size_bytes: document.size_bytes(),
        variant,
        full_text,
        fields,
    })
}

/// Builds the export record. Without fields there is nothing structured to
/// export.
pub fn build_export(parsed: ParsedResume) -> Result<ExportPayload, ExtractError> {
    let fields = parsed.fields.ok_or(ExtractError::ModelUnavailable)?;
    debug!(
        "Exporting {} as {} fields",
        parsed.file_name,
        fields.variant()
    );
    Ok(ExportPayload::new(parsed.file_name, fields, parsed.full_text))
}

/// Variant for a request: explicit query value, else the configured default.
pub fn resolve_variant(requested: Option<&str>, default: Variant) -> Result<Variant, String> {
    match requested {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::DynamicImage;

    use crate::extraction::OcrEngine;
    use crate::fields::entities::{Entity, EntityRecognizer};
    use crate::fields::FieldExtractors;
    use crate::models::fields::FieldMap;

    struct NoOcr;

    #[async_trait]
    impl OcrEngine for NoOcr {
        async fn recognize(&self, _image: &DynamicImage) -> Result<Vec<String>, ExtractError> {
            Ok(vec![])
        }
    }

    struct NameSpotter;

    impl EntityRecognizer for NameSpotter {
        fn recognize(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
            Ok(text
                .split_whitespace()
                .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
                .map(|w| Entity::new(w, "PERSON"))
                .collect())
        }
    }

    fn text_extractor() -> TextExtractor {
        TextExtractor::new(Arc::new(NoOcr))
    }

    fn txt(name: &str, body: &str) -> Document {
        Document::from_upload(name, Bytes::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_pattern_variant_end_to_end() {
        let extractors = FieldExtractors::new(None);
        let doc = txt(
            "cv.txt",
            "Contact: jane@example.com or 555-123-4567. Education: BSc in CS.",
        );
        let parsed = parse_document(&doc, &text_extractor(), extractors.pattern.clone())
            .await
            .unwrap();
        assert_eq!(parsed.variant, Variant::Pattern);
        assert_eq!(parsed.size_bytes, 64);
        match parsed.fields {
            Some(FieldMap::Patterns(ref f)) => {
                assert_eq!(f.email, vec!["jane@example.com"]);
                assert_eq!(f.education, vec!["Education: BSc in CS."]);
            }
            ref other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pattern_variant_rejects_images() {
        let extractors = FieldExtractors::new(None);
        let doc = Document::from_upload("scan.png", Bytes::from_static(b"png")).unwrap();
        let err = parse_document(&doc, &text_extractor(), extractors.pattern.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == "png"));
    }

    #[tokio::test]
    async fn test_entity_variant_without_model_returns_text_only() {
        let extractors = FieldExtractors::new(None);
        let parsed = parse_document(&txt("cv.txt", "Jane Doe"), &text_extractor(), extractors.entity.clone())
            .await
            .unwrap();
        assert_eq!(parsed.full_text, "Jane Doe");
        assert!(parsed.fields.is_none());
        assert!(matches!(build_export(parsed), Err(ExtractError::ModelUnavailable)));
    }

    #[tokio::test]
    async fn test_entity_variant_with_model_exports() {
        let extractors = FieldExtractors::new(Some(Arc::new(NameSpotter)));
        let parsed = parse_document(&txt("cv.txt", "met Ada and Grace"), &text_extractor(), extractors.entity.clone())
            .await
            .unwrap();
        let export = build_export(parsed).unwrap();
        assert_eq!(export.file_name, "cv.txt");
        assert_eq!(export.full_text, "met Ada and Grace");
        match export.fields {
            FieldMap::Entities(f) => assert_eq!(f.names, vec!["Ada", "Grace"]),
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_yields_no_partial_result() {
        let extractors = FieldExtractors::new(None);
        let doc = Document::from_upload("cv.txt", Bytes::from_static(&[0xc3, 0x28])).unwrap();
        let result = parse_document(&doc, &text_extractor(), extractors.pattern.clone()).await;
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn test_resolve_variant() {
        assert_eq!(resolve_variant(None, Variant::Entity).unwrap(), Variant::Entity);
        assert_eq!(resolve_variant(Some(""), Variant::Pattern).unwrap(), Variant::Pattern);
        assert_eq!(resolve_variant(Some("regex"), Variant::Entity).unwrap(), Variant::Pattern);
        assert!(resolve_variant(Some("llm"), Variant::Entity).is_err());
    }
}
