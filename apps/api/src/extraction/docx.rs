//! DOCX text extraction.
//!
//! DOCX files are ZIP archives of WordprocessingML parts. Page headers
//! (`word/header*.xml`) come first, then the body in `word/document.xml`,
//! then page footers (`word/footer*.xml`). Paragraph text is collected in
//! document order within each part.

use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::errors::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// All paragraph text of headers, body and footers, joined by `\n`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Extraction(format!("failed to open DOCX archive: {e}")))?;

    let headers = numbered_parts(&archive, "word/header");
    let footers = numbered_parts(&archive, "word/footer");

    let mut paragraphs = Vec::new();
    for name in &headers {
        paragraphs.extend(parse_paragraphs(&read_part(&mut archive, name)?, name)?);
    }
    paragraphs.extend(parse_paragraphs(
        &read_part(&mut archive, DOCUMENT_PART)?,
        DOCUMENT_PART,
    )?);
    for name in &footers {
        paragraphs.extend(parse_paragraphs(&read_part(&mut archive, name)?, name)?);
    }

    tracing::debug!(
        "DOCX has {} paragraphs ({} headers, {} footers)",
        paragraphs.len(),
        headers.len(),
        footers.len()
    );
    Ok(paragraphs.join("\n"))
}

/// Names like `word/header2.xml`, in archive order.
fn numbered_parts<R: Read + Seek>(archive: &ZipArchive<R>, prefix: &str) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".xml"))
                .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
        })
        .map(str::to_string)
        .collect()
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut xml = String::new();
    archive
        .by_name(name)
        .map_err(|e| ExtractError::Extraction(format!("{name} missing: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Extraction(format!("failed to read {name}: {e}")))?;
    Ok(xml)
}

/// Walks top-level `w:p` elements; `w:t` contributes text, `w:tab` a tab and
/// `w:br`/`w:cr` a line break (only inside runs, so tab stops in paragraph
/// properties are ignored). Paragraphs nested in text boxes stay inside the
/// enclosing paragraph, separated by a line break.
fn parse_paragraphs(xml: &str, part: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut para_depth = 0usize;
    let mut run_depth = 0usize;
    let mut text_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => para_depth += 1,
                b"r" => run_depth += 1,
                b"t" => text_depth += 1,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    para_depth = para_depth.saturating_sub(1);
                    if para_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    } else {
                        current.push('\n');
                    }
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => text_depth = text_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" if para_depth == 0 => paragraphs.push(String::new()),
                b"p" => current.push('\n'),
                b"tab" if run_depth > 0 => current.push('\t'),
                b"br" | b"cr" if run_depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if text_depth > 0 {
                    let text = e.unescape().map_err(|err| {
                        ExtractError::Extraction(format!("bad text in {part}: {err}"))
                    })?;
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Extraction(format!(
                    "XML parse error in {part} at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}
