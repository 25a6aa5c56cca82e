//! Gemini (Google) structured-output provider.

use crate::error::{
    parse_retry_after, sanitize_error_message, AiErrorCause, Result, VihangamError,
};
use crate::model::provider::{GenerativeModel, ModelProviderKind, StructuredRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini model variants with multimodal input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.0 Flash (fast, economical).
    #[default]
    Flash20,
    /// Gemini 2.5 Flash.
    Flash25,
    /// Gemini 2.5 Pro (highest quality).
    Pro25,
}

impl GeminiModel {
    /// All variants, in display order.
    pub const ALL: [GeminiModel; 3] = [Self::Flash20, Self::Flash25, Self::Pro25];

    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash20 => "gemini-2.0-flash",
            Self::Flash25 => "gemini-2.5-flash",
            Self::Pro25 => "gemini-2.5-pro",
        }
    }

    /// Looks a variant up by its API identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id)
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL (proxies, test servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the HTTP timeout for a single request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                VihangamError::Config("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| VihangamError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(GeminiProvider {
            client,
            api_key,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

/// Gemini provider for schema-constrained multimodal generation.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// The model this provider talks to.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn generate_impl(&self, request: &StructuredRequest<'_>) -> Result<Value> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_structured_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = request.image.mime_type(),
            "submitted Gemini request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VihangamError::Timeout(start.elapsed())
                } else {
                    e.into()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let value = gemini_response.into_json()?;

        tracing::debug!(
            model = self.model.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini request complete"
        );

        Ok(value)
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> VihangamError {
    let text = sanitize_error_message(text);
    let lower = text.to_lowercase();

    if status == 503 || lower.contains("overloaded") {
        return VihangamError::ai(
            AiErrorCause::Overloaded,
            format!("[{status} Service Unavailable] {text}"),
        );
    }
    if status == 401
        || status == 403
        || lower.contains("api key not valid")
        || lower.contains("api_key_invalid")
    {
        return VihangamError::ai(AiErrorCause::InvalidCredentials, text);
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return VihangamError::ai(AiErrorCause::RateLimited { retry_after }, text);
    }
    if status == 404 {
        return VihangamError::ai(
            AiErrorCause::Unspecified,
            "Model not found. Verify the model name is correct.",
        );
    }
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return VihangamError::ai(AiErrorCause::ContentBlocked, text);
    }
    VihangamError::ai(AiErrorCause::Unspecified, format!("{status}: {text}"))
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    async fn generate(&self, request: &StructuredRequest<'_>) -> Result<Value> {
        self.generate_impl(request).await
    }

    fn kind(&self) -> ModelProviderKind {
        ModelProviderKind::Gemini
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(parse_error(status.as_u16(), &text, &headers))
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl GeminiRequest {
    fn from_structured_request(req: &StructuredRequest<'_>) -> Self {
        let parts = vec![
            GeminiRequestPart::Text {
                text: req.prompt.clone(),
            },
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.mime_type().to_string(),
                    data: req.image.payload().to_string(),
                },
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_mime_type: "application/json",
                response_schema: req.output_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Extracts the JSON object the model produced for the declared schema.
    fn into_json(self) -> Result<Value> {
        // Blocks on the prompt come back as HTTP 200
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
                return Err(VihangamError::ai(AiErrorCause::ContentBlocked, msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            VihangamError::ai(
                AiErrorCause::MalformedResponse,
                "No candidates in Gemini response",
            )
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => {
                    return Err(VihangamError::ai(
                        AiErrorCause::ContentBlocked,
                        format!("Content blocked by Gemini safety filter: {finish_reason}"),
                    ));
                }
                "MAX_TOKENS" => {
                    return Err(VihangamError::ai(
                        AiErrorCause::MalformedResponse,
                        "Response truncated at token limit",
                    ));
                }
                _ => {} // STOP and friends are normal
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(VihangamError::ai(
                AiErrorCause::MalformedResponse,
                "Empty response from Gemini",
            ));
        }

        let value: Value = serde_json::from_str(text.trim()).map_err(|e| {
            VihangamError::ai(
                AiErrorCause::MalformedResponse,
                format!("Gemini response is not valid JSON: {e}"),
            )
        })?;

        if !value.is_object() {
            return Err(VihangamError::ai(
                AiErrorCause::MalformedResponse,
                "Gemini response is not a JSON object",
            ));
        }

        Ok(value)
    }
}
