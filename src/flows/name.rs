//! Name flow: asks the model for a creative Indian name for an image.

use super::{parse_output, NameClient, NameResult};
use crate::error::Result;
use crate::image::EncodedImage;
use crate::model::{GenerativeModel, StructuredRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Instruction sent with every name request. The image follows as inline
/// media.
pub const NAME_PROMPT: &str = "You are an AI agent specializing in generating creative Indian names for images.

Based on the image, generate a creative and relevant Indian name.
The name should reflect the essence, theme, or prominent elements of the image.

Image:";

/// Input of the name flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameInput<'a> {
    /// The photo, as a data URI.
    #[serde(serialize_with = "data_uri")]
    pub photo_data_uri: &'a EncodedImage,
}

impl<'a> NameInput<'a> {
    /// Creates the input for an image.
    pub fn new(photo: &'a EncodedImage) -> Self {
        Self {
            photo_data_uri: photo,
        }
    }

    /// Renders the model request for this input.
    pub fn to_request(&self) -> StructuredRequest<'a> {
        StructuredRequest::new(NAME_PROMPT, self.photo_data_uri, NameOutput::schema())
    }
}

/// Output of the name flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameOutput {
    /// A creative, relevant Indian name for the image.
    pub indian_name: String,
}

impl NameOutput {
    /// Response schema declared to the model.
    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "indianName": {
                    "type": "STRING",
                    "description": "A creative, relevant Indian name for the image."
                }
            },
            "required": ["indianName"]
        })
    }
}

pub(super) fn data_uri<S: Serializer>(
    image: &&EncodedImage,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(image.as_str())
}

/// [`NameClient`] backed by a [`GenerativeModel`].
pub struct NameFlow<M> {
    model: M,
}

impl<M: GenerativeModel> NameFlow<M> {
    /// Creates the flow over the given model.
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: GenerativeModel> NameClient for NameFlow<M> {
    async fn generate_name(&self, image: &EncodedImage) -> Result<NameResult> {
        let request = NameInput::new(image).to_request();
        let value = self.model.generate(&request).await?;
        let output: NameOutput = parse_output(value, "name")?;
        NameResult::new(output.indian_name)
    }
}
