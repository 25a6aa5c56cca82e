//! Image loading and data-URI encoding.

mod loader;
mod types;

pub use loader::{load_image, FALLBACK_MIME_TYPE};
pub use types::{EncodedImage, ImageFormat};
