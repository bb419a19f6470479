//! Image selection checks
//!
//! Size and media-type rules applied before an image is accepted.

use std::path::Path;

use crate::error::ValidationError;

/// Media type prefix every accepted file must declare.
const IMAGE_MIME_PREFIX: &str = "image/";

/// Validates the declared media type of a selected file.
///
/// A missing media type is rejected: a file whose type cannot be determined
/// is not treated as an image.
pub fn validate_media_type(media_type: Option<&str>) -> Result<(), ValidationError> {
    match media_type {
        Some(mt) if mt.trim().to_ascii_lowercase().starts_with(IMAGE_MIME_PREFIX) => Ok(()),
        other => Err(ValidationError::NotAnImage {
            media_type: other.map(str::to_string),
        }),
    }
}

/// Validates the size of a selected file. `max_size` itself is allowed.
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), ValidationError> {
    if size > max_size {
        Err(ValidationError::FileTooLarge {
            size,
            max: max_size,
        })
    } else {
        Ok(())
    }
}

/// Media type for a path, inferred from its extension.
///
/// Covers the formats the extraction service accepts plus TIFF.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        "txt" => Some("text/plain"),
        "json" => Some("application/json"),
        "pdf" => Some("application/pdf"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}
