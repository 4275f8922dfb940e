use crate::errors::ExtractError;

/// Page texts in order, each followed by a newline. Empty pages contribute
/// just the newline.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractError::Extraction("PDF decoder aborted on malformed input".into()))?
        .map_err(|e| ExtractError::Extraction(format!("invalid PDF: {e}")))?;
    tracing::debug!("PDF has {} pages", pages.len());
    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        text.push_str(page);
        text.push('\n');
    }
    text
}
