//! PDF text extraction — the document boundary of the pipeline.
//!
//! Input documents arrive base64-encoded in the request body. Extraction is
//! a pure function of the bytes: decode, parse, concatenate page text, trim.
//! Scanned/image-only PDFs yield no text and are rejected as unsupported.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty or contains no extractable text")]
    Empty,

    #[error("invalid document: {0}")]
    Parse(String),

    #[error("extraction capability unavailable")]
    Unavailable,
}

/// Decodes a base64 PDF payload and extracts its plain text.
///
/// pdf-extract is known to panic on some malformed inputs, so the parse runs
/// under `catch_unwind` and an abort is reported as `Unavailable` rather than
/// taking the request task down.
pub fn extract_pdf_text(pdf_base64: &str) -> Result<String, ExtractError> {
    let bytes = BASE64
        .decode(pdf_base64.trim())
        .map_err(|e| ExtractError::Parse(format!("invalid base64: {e}")))?;

    let text = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(&bytes)
    }))
    .map_err(|_| ExtractError::Unavailable)?
    .map_err(|e| ExtractError::Parse(e.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}
