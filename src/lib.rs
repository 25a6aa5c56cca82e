#![warn(missing_docs)]
//! InstaVihangam - creative Indian names and Instagram captions for images.
//!
//! An image is encoded as a data URI and sent to a multimodal model twice:
//! first to invent a name that fits the picture, then to write a caption that
//! features that name. The [`Orchestrator`] runs the two requests in order
//! and keeps whatever was obtained if the second one fails.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use instavihangam::{CaptionFlow, GeminiProvider, GenerationState, NameFlow, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> instavihangam::Result<()> {
//!     let model = Arc::new(GeminiProvider::builder().build()?);
//!     let mut orchestrator =
//!         Orchestrator::new(NameFlow::new(model.clone()), CaptionFlow::new(model));
//!
//!     orchestrator.select_image("cat.jpg").await?;
//!     match orchestrator.generate().await? {
//!         GenerationState::Succeeded { name, caption } => println!("{name}\n\n{caption}"),
//!         other => eprintln!("{}", other.error_message().unwrap_or("no result")),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): Google Gemini backend
//! - `cli`: the `instavihangam` command-line front end

mod error;
pub mod flows;
pub mod image;
pub mod model;
mod orchestrator;
mod preview;

#[cfg(test)]
mod test_support;

// Re-export error types at crate root
pub use error::{AiErrorCause, Result, VihangamError};

pub use flows::{
    CaptionClient, CaptionFlow, CaptionResult, NameClient, NameFlow, NameResult,
};
pub use image::{load_image, EncodedImage, ImageFormat};
pub use model::{GenerativeModel, ModelProviderKind, StructuredRequest};
pub use orchestrator::{GenerationState, Orchestrator, DEFAULT_REQUEST_TIMEOUT};
pub use preview::{PostPreview, PREVIEW_CAPTION_LINES};

#[cfg(feature = "gemini")]
pub use model::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, VihangamError};
    pub use crate::flows::{CaptionFlow, NameFlow};
    pub use crate::image::EncodedImage;
    pub use crate::model::GenerativeModel;
    pub use crate::orchestrator::{GenerationState, Orchestrator};

    #[cfg(feature = "gemini")]
    pub use crate::model::providers::GeminiProvider;
}
