use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures while turning an uploaded document into text and fields.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("Entity model unavailable")]
    ModelUnavailable,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Extract(e) => {
                let (status, code) = match e {
                    ExtractError::UnsupportedFormat(_) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
                    }
                    ExtractError::Extraction(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR")
                    }
                    ExtractError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
                    ExtractError::ModelUnavailable => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "MODEL_UNAVAILABLE")
                    }
                };
                tracing::warn!("Extraction failed: {e}");
                (status, code, e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message_names_extension() {
        let err = ExtractError::UnsupportedFormat("bmp".to_string());
        assert_eq!(err.to_string(), "Unsupported file format: bmp");
    }

    #[test]
    fn test_extract_errors_map_to_status_codes() {
        let cases = [
            (
                AppError::from(ExtractError::UnsupportedFormat("gif".into())),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                AppError::from(ExtractError::Extraction("bad xref".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(ExtractError::ModelUnavailable),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Validation("missing file".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_decode_error_code() {
        let utf8_err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let (status, code, _) = AppError::from(ExtractError::from(utf8_err)).parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "DECODE_ERROR");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let (status, _, message) = AppError::Internal(anyhow::anyhow!("secret path")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret"));
    }
}
