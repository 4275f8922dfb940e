use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::errors::ExtractError;

/// File formats the text extractor knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Jpg,
    Jpeg,
    Png,
}

impl DocumentFormat {
    /// Maps a lower-cased extension to a format.
    pub fn from_extension(ext: &str) -> Result<Self, ExtractError> {
        match ext {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            "jpg" => Ok(DocumentFormat::Jpg),
            "jpeg" => Ok(DocumentFormat::Jpeg),
            "png" => Ok(DocumentFormat::Png),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Txt => "txt",
            DocumentFormat::Jpg => "jpg",
            DocumentFormat::Jpeg => "jpeg",
            DocumentFormat::Png => "png",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(
            self,
            DocumentFormat::Jpg | DocumentFormat::Jpeg | DocumentFormat::Png
        )
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extension as the upload boundary sees it: everything after the last `.`,
/// lower-cased. A name without a dot yields the whole name.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// An uploaded resume. Immutable once received.
#[derive(Debug, Clone)]
pub struct Document {
    file_name: String,
    format: DocumentFormat,
    content: Bytes,
}

impl Document {
    /// Builds a document from a client filename, rejecting unknown extensions.
    pub fn from_upload(file_name: impl Into<String>, content: Bytes) -> Result<Self, ExtractError> {
        let file_name = file_name.into();
        let format = DocumentFormat::from_extension(&extension_of(&file_name))?;
        Ok(Document {
            file_name,
            format,
            content,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_last_segment_lowercased() {
        assert_eq!(extension_of("Jane.Doe.CV.PDF"), "pdf");
        assert_eq!(extension_of("resume.docx"), "docx");
        assert_eq!(extension_of("README"), "readme");
    }

    #[test]
    fn test_from_upload_rejects_bmp() {
        let err = Document::from_upload("scan.bmp", Bytes::from_static(b"BM")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == "bmp"));
        assert!(err.to_string().starts_with("Unsupported file format"));
    }

    #[test]
    fn test_from_upload_keeps_name_and_size() {
        let doc = Document::from_upload("cv.TXT", Bytes::from_static(b"hello")).unwrap();
        assert_eq!(doc.file_name(), "cv.TXT");
        assert_eq!(doc.format(), DocumentFormat::Txt);
        assert_eq!(doc.size_bytes(), 5);
    }

    #[test]
    fn test_image_formats() {
        assert!(DocumentFormat::Jpeg.is_image());
        assert!(DocumentFormat::Png.is_image());
        assert!(!DocumentFormat::Pdf.is_image());
    }
}
