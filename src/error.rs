//! Error types for name and caption generation.

use std::time::Duration;

/// Why the AI service rejected or failed a request.
///
/// Populated by the model client from the HTTP status and response body, so
/// callers never have to inspect error text to decide what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiErrorCause {
    /// Model overloaded or service temporarily unavailable (HTTP 503).
    Overloaded,
    /// API key missing, malformed, or rejected.
    InvalidCredentials,
    /// Quota or rate limit exceeded.
    RateLimited {
        /// Suggested wait before retrying, if the service sent one.
        retry_after: Option<Duration>,
    },
    /// Prompt or output blocked by safety filters.
    ContentBlocked,
    /// Response did not match the declared output schema, or was empty.
    MalformedResponse,
    /// Service unreachable (connect, DNS, TLS, reset).
    Unavailable,
    /// Anything else.
    Unspecified,
}

impl std::fmt::Display for AiErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overloaded => write!(f, "overloaded"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::RateLimited { .. } => write!(f, "rate limited"),
            Self::ContentBlocked => write!(f, "content blocked"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Errors that can occur while loading an image or generating content.
#[derive(Debug, thiserror::Error)]
pub enum VihangamError {
    /// The selected image could not be read or encoded.
    #[error("failed to read image: {0}")]
    ImageRead(String),

    /// The AI service failed or answered with something unusable.
    #[error("AI service error ({cause}): {message}")]
    AiService { cause: AiErrorCause, message: String },

    /// A single AI request did not finish in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Generation was requested before any image was selected.
    #[error("no image selected")]
    NoImage,

    /// Invalid configuration (e.g. missing API key).
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VihangamError {
    /// Shorthand for an [`VihangamError::AiService`] error.
    pub fn ai(cause: AiErrorCause, message: impl Into<String>) -> Self {
        Self::AiService {
            cause,
            message: message.into(),
        }
    }

    /// Returns the AI failure cause, if this is an AI service error.
    pub fn cause(&self) -> Option<AiErrorCause> {
        match self {
            Self::AiService { cause, .. } => Some(*cause),
            _ => None,
        }
    }

    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::AiService { cause, .. } => matches!(
                cause,
                AiErrorCause::Overloaded
                    | AiErrorCause::RateLimited { .. }
                    | AiErrorCause::Unavailable
            ),
            _ => false,
        }
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::AiService {
                cause: AiErrorCause::RateLimited { retry_after },
                ..
            } => *retry_after,
            Self::AiService {
                cause: AiErrorCause::Overloaded,
                ..
            } => Some(Duration::from_secs(5)),
            Self::Timeout(_) => Some(Duration::from_secs(1)),
            _ => None,
        }
    }

    /// Message suitable for showing to the end user in an error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::ImageRead(_) => "Failed to load image. Please try another one.".into(),
            Self::NoImage => "Please upload an image first.".into(),
            Self::AiService {
                cause: AiErrorCause::Overloaded,
                ..
            } => "The AI model is currently overloaded. Please try again in a few moments.".into(),
            Self::AiService {
                cause: AiErrorCause::InvalidCredentials,
                ..
            }
            | Self::Config(_) => "AI configuration error. Please check the API key.".into(),
            Self::AiService { message, .. } => {
                format!("Failed to generate content: {message}. Please try again.")
            }
            other => format!("Failed to generate content: {other}. Please try again."),
        }
    }
}

impl From<reqwest::Error> for VihangamError {
    fn from(err: reqwest::Error) -> Self {
        let cause = if err.is_decode() {
            AiErrorCause::MalformedResponse
        } else if err.is_connect() || err.is_request() || err.is_timeout() {
            AiErrorCause::Unavailable
        } else {
            AiErrorCause::Unspecified
        };
        Self::ai(cause, err.to_string())
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, VihangamError>;

const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Trims an API error body for display and redacts anything that looks like
/// an API key echoed back by the service.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_');
            if bare.starts_with("AIza") && bare.len() >= 30 {
                word.replace(bare, "[REDACTED]")
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = joined.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}…")
    } else {
        joined
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(VihangamError::ai(AiErrorCause::Overloaded, "503").is_retryable());
        assert!(VihangamError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(
            VihangamError::ai(AiErrorCause::RateLimited { retry_after: None }, "429")
                .is_retryable()
        );

        assert!(!VihangamError::ai(AiErrorCause::InvalidCredentials, "bad key").is_retryable());
        assert!(!VihangamError::ai(AiErrorCause::MalformedResponse, "{}").is_retryable());
        assert!(!VihangamError::ImageRead("missing".into()).is_retryable());
        assert!(!VihangamError::NoImage.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let limited = VihangamError::ai(
            AiErrorCause::RateLimited {
                retry_after: Some(Duration::from_secs(60)),
            },
            "slow down",
        );
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(60)));

        let timeout = VihangamError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.retry_after(), Some(Duration::from_secs(1)));

        let creds = VihangamError::ai(AiErrorCause::InvalidCredentials, "bad");
        assert_eq!(creds.retry_after(), None);
    }

    #[test]
    fn test_user_message_by_cause() {
        let overloaded = VihangamError::ai(AiErrorCause::Overloaded, "[503 Service Unavailable]");
        assert_eq!(
            overloaded.user_message(),
            "The AI model is currently overloaded. Please try again in a few moments."
        );

        let creds = VihangamError::ai(AiErrorCause::InvalidCredentials, "API key not valid");
        assert_eq!(
            creds.user_message(),
            "AI configuration error. Please check the API key."
        );

        let other = VihangamError::ai(AiErrorCause::MalformedResponse, "missing field `indianName`");
        assert_eq!(
            other.user_message(),
            "Failed to generate content: missing field `indianName`. Please try again."
        );

        assert_eq!(
            VihangamError::ImageRead("eof".into()).user_message(),
            "Failed to load image. Please try another one."
        );
        assert_eq!(
            VihangamError::NoImage.user_message(),
            "Please upload an image first."
        );
    }

    #[test]
    fn test_error_display() {
        let err = VihangamError::ai(AiErrorCause::Overloaded, "model is overloaded");
        assert_eq!(
            err.to_string(),
            "AI service error (overloaded): model is overloaded"
        );
        assert_eq!(err.cause(), Some(AiErrorCause::Overloaded));
        assert_eq!(VihangamError::NoImage.cause(), None);
    }

    #[test]
    fn test_sanitize_redacts_keys_and_truncates() {
        let key = "AIzaSyDUMMYDUMMYDUMMYDUMMYDUMMY12345";
        let msg = sanitize_error_message(&format!("API key not valid: \"{key}\""));
        assert!(!msg.contains(key));
        assert!(msg.contains("[REDACTED]"));

        let long = "x ".repeat(400);
        let msg = sanitize_error_message(&long);
        assert!(msg.chars().count() <= MAX_ERROR_MESSAGE_LEN + 1);
        assert!(msg.ends_with('…'));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(reqwest::header::RETRY_AFTER, "17".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(17));
        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
