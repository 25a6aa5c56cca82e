//! Mocks shared by the unit tests.

use crate::error::Result;
use crate::flows::{CaptionClient, CaptionResult, NameClient, NameResult};
use crate::image::EncodedImage;
use crate::model::{GenerativeModel, ModelProviderKind, StructuredRequest};
use crate::orchestrator::GenerationState;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub(crate) fn sample_image() -> EncodedImage {
    EncodedImage::parse("data:image/jpeg;base64,AAAA").unwrap()
}

/// Model that replays canned answers and records the prompts it received.
#[derive(Clone, Default)]
pub(crate) struct ScriptedModel {
    answers: Arc<Mutex<VecDeque<Result<Value>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub(crate) fn new(answers: Vec<Result<Value>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            prompts: Arc::default(),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &StructuredRequest<'_>) -> Result<Value> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedModel ran out of answers")
    }

    fn kind(&self) -> ModelProviderKind {
        ModelProviderKind::Gemini
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Name client with a fixed outcome that counts calls and snapshots the
/// published state at call time.
#[derive(Clone)]
pub(crate) struct MockNameClient {
    outcome: Arc<dyn Fn() -> Result<NameResult> + Send + Sync>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    observer: Arc<Mutex<Option<watch::Receiver<GenerationState>>>>,
    seen: Arc<Mutex<Vec<GenerationState>>>,
}

impl MockNameClient {
    pub(crate) fn returning(name: &'static str) -> Self {
        Self::with(move || NameResult::new(name))
    }

    pub(crate) fn failing(err: fn() -> crate::VihangamError) -> Self {
        Self::with(move || Err(err()))
    }

    fn with(outcome: impl Fn() -> Result<NameResult> + Send + Sync + 'static) -> Self {
        Self {
            outcome: Arc::new(outcome),
            calls: Arc::default(),
            delay: None,
            observer: Arc::default(),
            seen: Arc::default(),
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn observe(&self, rx: watch::Receiver<GenerationState>) {
        *self.observer.lock().unwrap() = Some(rx);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_states(&self) -> Vec<GenerationState> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameClient for MockNameClient {
    async fn generate_name(&self, _image: &EncodedImage) -> Result<NameResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            self.seen.lock().unwrap().push(rx.borrow().clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.outcome)()
    }
}

/// Caption client counterpart of [`MockNameClient`]; also records the name
/// it was called with.
#[derive(Clone)]
pub(crate) struct MockCaptionClient {
    outcome: Arc<dyn Fn(&NameResult) -> Result<CaptionResult> + Send + Sync>,
    calls: Arc<AtomicUsize>,
    names: Arc<Mutex<Vec<NameResult>>>,
    observer: Arc<Mutex<Option<watch::Receiver<GenerationState>>>>,
    seen: Arc<Mutex<Vec<GenerationState>>>,
}

impl MockCaptionClient {
    pub(crate) fn returning(caption: &'static str) -> Self {
        Self::with(move |_| CaptionResult::new(caption))
    }

    pub(crate) fn failing(err: fn() -> crate::VihangamError) -> Self {
        Self::with(move |_| Err(err()))
    }

    fn with(
        outcome: impl Fn(&NameResult) -> Result<CaptionResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            outcome: Arc::new(outcome),
            calls: Arc::default(),
            names: Arc::default(),
            observer: Arc::default(),
            seen: Arc::default(),
        }
    }

    pub(crate) fn observe(&self, rx: watch::Receiver<GenerationState>) {
        *self.observer.lock().unwrap() = Some(rx);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn names(&self) -> Vec<NameResult> {
        self.names.lock().unwrap().clone()
    }

    pub(crate) fn seen_states(&self) -> Vec<GenerationState> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionClient for MockCaptionClient {
    async fn generate_caption(
        &self,
        _image: &EncodedImage,
        name: &NameResult,
    ) -> Result<CaptionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.names.lock().unwrap().push(name.clone());
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            self.seen.lock().unwrap().push(rx.borrow().clone());
        }
        (self.outcome)(name)
    }
}
