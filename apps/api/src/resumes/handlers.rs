//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::document::Document;
use crate::models::fields::{export_file_name, ParsedResume};
use crate::resumes::pipeline::{build_export, parse_document, resolve_variant};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub variant: Option<String>,
}

/// POST /api/v1/resumes/parse
///
/// Multipart upload (`file`). Returns file details, full text and the
/// variant's fields (`null` when no entity model is loaded).
pub async fn handle_parse(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
    multipart: Multipart,
) -> Result<Json<ParsedResume>, AppError> {
    let parsed = run_upload(&state, query, multipart).await?;
    Ok(Json(parsed))
}

/// POST /api/v1/resumes/export
///
/// Same input as parse; answers with `resume_data_<filename>.json` as a download.
pub async fn handle_export(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let parsed = run_upload(&state, query, multipart).await?;
    let download_name = export_file_name(&parsed.file_name);
    let payload = build_export(parsed)?;
    let body = payload
        .to_json()
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&download_name)),
        ],
        body,
    )
        .into_response())
}

async fn run_upload(
    state: &AppState,
    query: VariantQuery,
    multipart: Multipart,
) -> Result<ParsedResume, AppError> {
    let variant = resolve_variant(query.variant.as_deref(), state.config.default_variant)
        .map_err(AppError::Validation)?;
    let document = read_upload(multipart).await?;
    let extractor = state.field_extractors.for_variant(variant).clone();
    Ok(parse_document(&document, &state.text_extractor, extractor).await?)
}

/// Pulls the `file` field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Document, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Validation("uploaded file has no filename".to_string()))?;
        let content = field.bytes().await.map_err(multipart_error)?;
        return Ok(Document::from_upload(file_name, content)?);
    }
    Err(AppError::Validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("invalid multipart body: {}", e.body_text()))
    }
}

/// `attachment; filename="..."` with characters that would break the quoted
/// string replaced.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
