//! Generative model trait and the structured request it accepts.

use crate::error::Result;
use crate::image::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProviderKind {
    /// Google Gemini models.
    Gemini,
}

impl std::fmt::Display for ModelProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// One multimodal request: an instruction, the image it refers to, and the
/// JSON schema the answer must satisfy.
#[derive(Debug, Clone)]
pub struct StructuredRequest<'a> {
    /// Rendered instruction text.
    pub prompt: String,
    /// Image attached as inline media.
    pub image: &'a EncodedImage,
    /// JSON schema (OpenAPI subset) for the response object.
    pub output_schema: Value,
}

impl<'a> StructuredRequest<'a> {
    /// Creates a new request.
    pub fn new(prompt: impl Into<String>, image: &'a EncodedImage, output_schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            output_schema,
        }
    }
}

/// A multimodal text model that answers with schema-constrained JSON.
///
/// Implementations return the raw JSON object; checking it against the
/// caller's typed output is the caller's job.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends the request and returns the model's JSON answer.
    async fn generate(&self, request: &StructuredRequest<'_>) -> Result<Value>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ModelProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            ModelProviderKind::Gemini => "Gemini (Google)",
        }
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<T: GenerativeModel + ?Sized> GenerativeModel for std::sync::Arc<T> {
    async fn generate(&self, request: &StructuredRequest<'_>) -> Result<Value> {
        (**self).generate(request).await
    }

    fn kind(&self) -> ModelProviderKind {
        (**self).kind()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ModelProviderKind::Gemini.to_string(), "gemini");
    }

    #[test]
    fn test_request_borrows_image() {
        let image = EncodedImage::from_bytes(&[1, 2, 3], "image/png");
        let request = StructuredRequest::new("Name it", &image, serde_json::json!({}));
        assert_eq!(request.prompt, "Name it");
        assert_eq!(request.image.mime_type(), "image/png");
    }
}
