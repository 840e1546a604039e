//! Helpers for normalizing client supplied input.

use sha2::{Digest, Sha256};

/// Trim a value and drop it when nothing remains.
pub fn sanitize_string(value: Option<String>) -> Option<String> {
    value.and_then(|input| {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Reduce a client filename to a safe, flat ASCII name.
///
/// Non-ASCII characters are dropped, path separators become spaces, anything outside
/// `[A-Za-z0-9_.-]` is removed, whitespace runs collapse to `_`, and leading or trailing `.`/`_`
/// are stripped. Returns `None` when nothing usable remains.
pub fn secure_filename(filename: &str) -> Option<String> {
    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Whether the client filename names a PDF.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
