//! Reference-image encoding.
//!
//! Uploaded files travel as self-describing data URLs
//! (`data:<mime>;base64,<payload>`). The generation backend's upload
//! endpoint wants only the raw base64 payload, so there is also a
//! helper to strip the header back off.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::error::CoreError;

/// Image MIME types accepted as reference uploads.
pub const VALID_IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Whether a MIME type is an accepted reference-image type.
pub fn is_valid_image_mime(mime: &str) -> bool {
    VALID_IMAGE_MIME_TYPES.contains(&mime)
}

/// Encode raw file bytes as a data URL.
///
/// The MIME type must be one of [`VALID_IMAGE_MIME_TYPES`]; anything
/// else is rejected before any encoding happens.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> Result<String, CoreError> {
    if !is_valid_image_mime(mime) {
        return Err(CoreError::Validation(format!(
            "Unsupported image MIME type '{mime}'. Must be one of: {}",
            VALID_IMAGE_MIME_TYPES.join(", ")
        )));
    }
    Ok(format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)))
}

/// The raw base64 payload of a data URL (everything after the first
/// comma), or `None` if the string has no data-URL header.
pub fn raw_base64(data_url: &str) -> Option<&str> {
    data_url.split_once(',').map(|(_, payload)| payload)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
