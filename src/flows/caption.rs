//! Caption flow: asks the model for an Instagram caption that uses the name.

use super::name::data_uri;
use super::{parse_output, CaptionClient, CaptionResult, NameResult};
use crate::error::Result;
use crate::image::EncodedImage;
use crate::model::{GenerativeModel, StructuredRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Instruction template for caption requests; `{name}` is replaced with the
/// generated name. The image follows as inline media.
pub const CAPTION_PROMPT: &str = "You are a social media expert who writes engaging Instagram captions.

Write an engaging Instagram caption for the image below. The caption must
feature the creative Indian name \"{name}\" that was given to this image.
Keep it warm and vivid, reflect what is shown in the image, and end with a
few relevant hashtags. Emojis are welcome.

Image:";

/// Input of the caption flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionInput<'a> {
    /// The photo, as a data URI.
    #[serde(serialize_with = "data_uri")]
    pub photo_data_uri: &'a EncodedImage,
    /// Name produced by the name flow for the same image.
    pub creative_indian_name: &'a NameResult,
}

impl<'a> CaptionInput<'a> {
    /// Creates the input for an image and its name.
    pub fn new(photo: &'a EncodedImage, name: &'a NameResult) -> Self {
        Self {
            photo_data_uri: photo,
            creative_indian_name: name,
        }
    }

    /// Renders the model request for this input.
    pub fn to_request(&self) -> StructuredRequest<'a> {
        let prompt = CAPTION_PROMPT.replace("{name}", self.creative_indian_name.as_str());
        StructuredRequest::new(prompt, self.photo_data_uri, CaptionOutput::schema())
    }
}

/// Output of the caption flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionOutput {
    /// An engaging Instagram caption featuring the name.
    pub instagram_caption: String,
}

impl CaptionOutput {
    /// Response schema declared to the model.
    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "instagramCaption": {
                    "type": "STRING",
                    "description": "An engaging Instagram caption for the image that features the given name."
                }
            },
            "required": ["instagramCaption"]
        })
    }
}

/// [`CaptionClient`] backed by a [`GenerativeModel`].
pub struct CaptionFlow<M> {
    model: M,
}

impl<M: GenerativeModel> CaptionFlow<M> {
    /// Creates the flow over the given model.
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: GenerativeModel> CaptionClient for CaptionFlow<M> {
    async fn generate_caption(
        &self,
        image: &EncodedImage,
        name: &NameResult,
    ) -> Result<CaptionResult> {
        let request = CaptionInput::new(image, name).to_request();
        let value = self.model.generate(&request).await?;
        let output: CaptionOutput = parse_output(value, "caption")?;
        CaptionResult::new(output.instagram_caption)
    }
}
