//! Sequences name and caption generation and owns the generation state.
//!
//! An attempt runs strictly in order: the caption request is only issued
//! once the name request has returned a [`NameResult`]. Every transition is
//! published on a [`tokio::sync::watch`] channel so presentation code can
//! render progress without sharing mutable flags.

use crate::error::{Result, VihangamError};
use crate::flows::{CaptionClient, CaptionResult, NameClient, NameResult};
use crate::image::{load_image, EncodedImage};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

/// Default bound on a single AI request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the current generation attempt stands.
///
/// A caption only ever appears next to the name it was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationState {
    /// No attempt since the last image was selected.
    #[default]
    Idle,
    /// Requests in flight. `name` is filled in once the first stage is done.
    InProgress {
        /// Name from the first stage, if it has finished.
        name: Option<NameResult>,
    },
    /// Both stages finished.
    Succeeded {
        /// Generated name.
        name: NameResult,
        /// Caption generated from `name`.
        caption: CaptionResult,
    },
    /// The name was generated but the caption failed. The attempt counts as
    /// failed; the name is kept for display.
    PartiallySucceeded {
        /// Generated name.
        name: NameResult,
        /// User-facing error message.
        message: String,
    },
    /// Name generation failed; nothing to show.
    Failed {
        /// User-facing error message.
        message: String,
    },
}

impl GenerationState {
    /// The generated name, if any.
    pub fn name(&self) -> Option<&NameResult> {
        match self {
            Self::InProgress { name } => name.as_ref(),
            Self::Succeeded { name, .. } | Self::PartiallySucceeded { name, .. } => Some(name),
            Self::Idle | Self::Failed { .. } => None,
        }
    }

    /// The generated caption, if any.
    pub fn caption(&self) -> Option<&CaptionResult> {
        match self {
            Self::Succeeded { caption, .. } => Some(caption),
            _ => None,
        }
    }

    /// The user-facing error message, if the attempt failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::PartiallySucceeded { message, .. } | Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// True while requests are in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    /// True once an attempt has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::PartiallySucceeded { .. } | Self::Failed { .. }
        )
    }
}

/// Drives one generation attempt at a time over a name and a caption client.
///
/// `generate` borrows the orchestrator mutably, so a second attempt cannot
/// start while one is running. Dropping an unfinished `generate` future
/// cancels it; the next call supersedes the stale `InProgress` state.
pub struct Orchestrator<N, C> {
    names: N,
    captions: C,
    timeout: Duration,
    image: Option<EncodedImage>,
    state: watch::Sender<GenerationState>,
    attempts: u64,
}

impl<N: NameClient, C: CaptionClient> Orchestrator<N, C> {
    /// Creates an idle orchestrator with no image selected.
    pub fn new(names: N, captions: C) -> Self {
        let (state, _) = watch::channel(GenerationState::Idle);
        Self {
            names,
            captions,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            image: None,
            state,
            attempts: 0,
        }
    }

    /// Sets the bound applied to each AI request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// The currently selected image.
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Loads and selects an image file, discarding previous results.
    ///
    /// # Errors
    ///
    /// Returns [`VihangamError::ImageRead`] if the file cannot be loaded; the
    /// selection is then cleared and no generation can start until another
    /// image is selected.
    pub async fn select_image(&mut self, path: impl AsRef<Path>) -> Result<&EncodedImage> {
        self.image = None;
        self.publish(GenerationState::Idle);

        match load_image(path).await {
            Ok(image) => Ok(self.image.insert(image)),
            Err(e) => {
                tracing::warn!("image selection failed: {e}");
                Err(e)
            }
        }
    }

    /// Selects an already encoded image, discarding previous results.
    pub fn set_image(&mut self, image: EncodedImage) {
        self.image = Some(image);
        self.publish(GenerationState::Idle);
    }

    /// Runs one attempt: name, then caption, and returns the final state.
    ///
    /// AI failures do not surface as `Err`; they end the attempt in
    /// [`GenerationState::Failed`] or [`GenerationState::PartiallySucceeded`].
    ///
    /// # Errors
    ///
    /// Returns [`VihangamError::NoImage`] if no image is selected; the state
    /// is left untouched.
    pub async fn generate(&mut self) -> Result<GenerationState> {
        let image = self.image.as_ref().ok_or(VihangamError::NoImage)?;
        self.attempts += 1;
        let attempt = self.attempts;

        transition(&self.state, attempt, GenerationState::InProgress { name: None });

        let name = match bounded(self.timeout, self.names.generate_name(image)).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(attempt, "name generation failed: {e}");
                let failed = GenerationState::Failed {
                    message: e.user_message(),
                };
                transition(&self.state, attempt, failed.clone());
                return Ok(failed);
            }
        };

        transition(
            &self.state,
            attempt,
            GenerationState::InProgress {
                name: Some(name.clone()),
            },
        );

        let finished = match bounded(self.timeout, self.captions.generate_caption(image, &name))
            .await
        {
            Ok(caption) => GenerationState::Succeeded { name, caption },
            Err(e) => {
                tracing::warn!(attempt, "caption generation failed: {e}");
                GenerationState::PartiallySucceeded {
                    name,
                    message: e.user_message(),
                }
            }
        };

        transition(&self.state, attempt, finished.clone());
        Ok(finished)
    }

    fn publish(&self, state: GenerationState) {
        transition(&self.state, self.attempts, state);
    }
}

fn transition(tx: &watch::Sender<GenerationState>, attempt: u64, state: GenerationState) {
    tracing::info!(attempt, state = state_label(&state), "generation state changed");
    tx.send_replace(state);
}

fn state_label(state: &GenerationState) -> &'static str {
    match state {
        GenerationState::Idle => "idle",
        GenerationState::InProgress { name: None } => "naming",
        GenerationState::InProgress { name: Some(_) } => "captioning",
        GenerationState::Succeeded { .. } => "succeeded",
        GenerationState::PartiallySucceeded { .. } => "partially_succeeded",
        GenerationState::Failed { .. } => "failed",
    }
}

async fn bounded<T>(timeout: Duration, request: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| VihangamError::Timeout(timeout))?
}
