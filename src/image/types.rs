//! Image formats and the data-URI encoding sent to the AI service.

use crate::error::{Result, VihangamError};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Image formats recognised when sniffing a selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
    /// Windows bitmap.
    Bmp,
    /// TIFF (either byte order).
    Tiff,
    /// HEIC / HEIF container (iPhone photos).
    Heic,
    /// AVIF container.
    Avif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Heic => "image/heic",
            Self::Avif => "image/avif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jfif" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "heic" | "heif" => Some(Self::Heic),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(Self::Tiff);
        }

        if data.starts_with(b"BM") && data.len() >= 14 {
            return Some(Self::Bmp);
        }

        if data.len() < 12 {
            return None;
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        // ISO-BMFF: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            return match &data[8..12] {
                b"avif" | b"avis" => Some(Self::Avif),
                b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"mif1" | b"msf1" => {
                    Some(Self::Heic)
                }
                _ => None,
            };
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An image encoded as a `data:<mime>;base64,<payload>` URI.
///
/// Immutable once built. The MIME type and payload offsets are kept so the
/// URI can be split for inline transmission without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    uri: String,
    mime_end: usize,
}

impl EncodedImage {
    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(data: &[u8], mime_type: &str) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        let uri = format!("{DATA_PREFIX}{mime_type}{BASE64_MARKER}{payload}");
        Self {
            mime_end: DATA_PREFIX.len() + mime_type.len(),
            uri,
        }
    }

    /// Parses an existing data URI, validating its shape and payload.
    pub fn parse(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| VihangamError::ImageRead("not a data URI".into()))?;
        let marker = rest.find(BASE64_MARKER).ok_or_else(|| {
            VihangamError::ImageRead("data URI is not Base64 encoded".into())
        })?;
        let mime = &rest[..marker];
        if mime.is_empty() || !mime.contains('/') {
            return Err(VihangamError::ImageRead(format!(
                "data URI has invalid MIME type: {mime:?}"
            )));
        }
        let payload = &rest[marker + BASE64_MARKER.len()..];
        if payload.is_empty() {
            return Err(VihangamError::ImageRead("data URI has empty payload".into()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| VihangamError::ImageRead(format!("invalid Base64 payload: {e}")))?;

        Ok(Self {
            mime_end: DATA_PREFIX.len() + marker,
            uri,
        })
    }

    /// The full data URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// The declared MIME type, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> &str {
        &self.uri[DATA_PREFIX.len()..self.mime_end]
    }

    /// The Base64 payload without the `data:` header.
    pub fn payload(&self) -> &str {
        &self.uri[self.mime_end + BASE64_MARKER.len()..]
    }

    /// Approximate size of the decoded image in bytes.
    pub fn decoded_len(&self) -> usize {
        let payload = self.payload();
        let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
        payload.len() / 4 * 3 - padding
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for EncodedImage {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}
