//! Social post preview built from the image and the generation results.

use crate::image::EncodedImage;
use crate::orchestrator::GenerationState;
use serde::Serialize;

/// Caption lines shown in the preview before it is clamped.
pub const PREVIEW_CAPTION_LINES: usize = 3;

/// What a post would look like: the image, the name as a title, and the
/// first few caption lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPreview {
    /// MIME type of the image.
    pub mime_type: String,
    /// Decoded image size in bytes.
    pub image_bytes: usize,
    /// Title line (the generated name).
    pub title: Option<String>,
    /// Caption clamped to [`PREVIEW_CAPTION_LINES`] lines.
    pub caption_excerpt: Option<String>,
    /// True if the caption was longer than the excerpt.
    pub truncated: bool,
}

impl PostPreview {
    /// Builds a preview, or `None` while there is neither a name nor a
    /// caption to show.
    pub fn build(image: &EncodedImage, state: &GenerationState) -> Option<Self> {
        if state.is_in_progress() {
            return None;
        }
        let title = state.name().map(|n| n.as_str().to_string());
        let caption = state.caption().map(|c| c.as_str());
        if title.is_none() && caption.is_none() {
            return None;
        }

        let (caption_excerpt, truncated) = match caption {
            Some(text) => {
                let (excerpt, truncated) = clamp_lines(text, PREVIEW_CAPTION_LINES);
                (Some(excerpt), truncated)
            }
            None => (None, false),
        };

        Some(Self {
            mime_type: image.mime_type().to_string(),
            image_bytes: image.decoded_len(),
            title,
            caption_excerpt,
            truncated,
        })
    }
}

fn clamp_lines(text: &str, max: usize) -> (String, bool) {
    let mut lines = text.lines();
    let kept: Vec<&str> = lines.by_ref().take(max).collect();
    let truncated = lines.next().is_some();
    (kept.join("\n"), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{CaptionResult, NameResult};
    use crate::test_support::sample_image;

    fn name() -> NameResult {
        NameResult::new("Marigold Whiskers").unwrap()
    }

    #[test]
    fn test_no_preview_without_results() {
        let image = sample_image();
        assert!(PostPreview::build(&image, &GenerationState::Idle).is_none());
        assert!(PostPreview::build(
            &image,
            &GenerationState::Failed {
                message: "nope".into()
            }
        )
        .is_none());
        assert!(PostPreview::build(
            &image,
            &GenerationState::InProgress { name: Some(name()) }
        )
        .is_none());
    }

    #[test]
    fn test_partial_result_still_previews_name() {
        let image = sample_image();
        let state = GenerationState::PartiallySucceeded {
            name: name(),
            message: "caption failed".into(),
        };
        let preview = PostPreview::build(&image, &state).unwrap();
        assert_eq!(preview.title.as_deref(), Some("Marigold Whiskers"));
        assert!(preview.caption_excerpt.is_none());
        assert_eq!(preview.mime_type, "image/jpeg");
        assert_eq!(preview.image_bytes, 3);
    }

    #[test]
    fn test_caption_is_clamped() {
        let image = sample_image();
        let state = GenerationState::Succeeded {
            name: name(),
            caption: CaptionResult::new("one\ntwo\nthree\nfour\n#cats").unwrap(),
        };
        let preview = PostPreview::build(&image, &state).unwrap();
        assert_eq!(preview.caption_excerpt.as_deref(), Some("one\ntwo\nthree"));
        assert!(preview.truncated);
    }

    #[test]
    fn test_short_caption_not_truncated() {
        let image = sample_image();
        let state = GenerationState::Succeeded {
            name: name(),
            caption: CaptionResult::new("Golden days with Marigold Whiskers 🐾").unwrap(),
        };
        let preview = PostPreview::build(&image, &state).unwrap();
        assert!(!preview.truncated);
    }
}
