//! The two prompt flows: image → name, and image + name → caption.
//!
//! Each flow is a fixed instruction, a typed input, and a declared output
//! schema. [`NameClient`] and [`CaptionClient`] are the seams the
//! orchestrator depends on; [`NameFlow`] and [`CaptionFlow`] implement them
//! on top of any [`GenerativeModel`](crate::model::GenerativeModel).

mod caption;
mod name;

pub use caption::{CaptionFlow, CaptionInput, CaptionOutput, CAPTION_PROMPT};
pub use name::{NameFlow, NameInput, NameOutput, NAME_PROMPT};

use crate::error::{AiErrorCause, Result, VihangamError};
use crate::image::EncodedImage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A generated, non-empty name for an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NameResult(String);

impl NameResult {
    /// Wraps a generated name, trimming whitespace.
    ///
    /// # Errors
    ///
    /// A blank name is a malformed AI response.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        non_empty(name.into(), "name").map(Self)
    }

    /// The name text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated social-post caption. May span several lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CaptionResult(String);

impl CaptionResult {
    /// Wraps a generated caption, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// A blank caption is a malformed AI response.
    pub fn new(caption: impl Into<String>) -> Result<Self> {
        non_empty(caption.into(), "caption").map(Self)
    }

    /// The caption text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaptionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_empty(text: String, what: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VihangamError::ai(
            AiErrorCause::MalformedResponse,
            format!("AI service returned an empty {what}"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Generates a name for an image.
#[async_trait]
pub trait NameClient: Send + Sync {
    /// Issues exactly one request for the given image.
    async fn generate_name(&self, image: &EncodedImage) -> Result<NameResult>;
}

/// Generates a caption for an image that has already been named.
///
/// Taking a [`NameResult`] makes "caption without a name" unrepresentable.
#[async_trait]
pub trait CaptionClient: Send + Sync {
    /// Issues exactly one request for the given image and name.
    async fn generate_caption(
        &self,
        image: &EncodedImage,
        name: &NameResult,
    ) -> Result<CaptionResult>;
}

/// Deserializes a model answer into the flow's typed output.
///
/// Anything that does not fit the declared shape is a failure; nothing is
/// coerced.
fn parse_output<T: DeserializeOwned>(value: Value, flow: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        VihangamError::ai(
            AiErrorCause::MalformedResponse,
            format!("{flow} response does not match schema: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_result_trims_and_rejects_blank() {
        assert_eq!(
            NameResult::new("  Sapphire Peacock \n").unwrap().as_str(),
            "Sapphire Peacock"
        );
        let err = NameResult::new("   ").unwrap_err();
        assert_eq!(err.cause(), Some(AiErrorCause::MalformedResponse));
    }

    #[test]
    fn test_caption_keeps_inner_line_breaks() {
        let caption = CaptionResult::new("Line one\nLine two\n").unwrap();
        assert_eq!(caption.as_str(), "Line one\nLine two");
        assert!(CaptionResult::new("").is_err());
    }

    #[test]
    fn test_results_serialize_as_plain_strings() {
        let name = NameResult::new("Marigold Whiskers").unwrap();
        assert_eq!(
            serde_json::to_value(&name).unwrap(),
            serde_json::json!("Marigold Whiskers")
        );
    }
}
