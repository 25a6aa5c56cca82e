//! Reads a selected image file into an [`EncodedImage`].

use crate::error::{Result, VihangamError};
use crate::image::types::{EncodedImage, ImageFormat};
use std::path::Path;

/// MIME type used when neither the bytes nor the extension identify the file.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Loads an image file and encodes it as a data URI.
///
/// The MIME type is sniffed from magic bytes, then guessed from the file
/// extension. The content is otherwise not validated; interpreting the image
/// is left to the AI service.
///
/// # Errors
///
/// Returns [`VihangamError::ImageRead`] if the file cannot be read or is
/// empty.
pub async fn load_image(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| VihangamError::ImageRead(format!("{}: {e}", path.display())))?;

    if data.is_empty() {
        return Err(VihangamError::ImageRead(format!(
            "{}: file is empty",
            path.display()
        )));
    }

    let mime_type = detect_mime_type(path, &data);
    tracing::debug!(
        path = %path.display(),
        mime_type,
        size_bytes = data.len(),
        "loaded image"
    );

    Ok(EncodedImage::from_bytes(&data, mime_type))
}

fn detect_mime_type(path: &Path, data: &[u8]) -> &'static str {
    ImageFormat::from_magic_bytes(data)
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .map(|f| f.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}
