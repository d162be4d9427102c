//! `StubBackend`: an in-memory [`GenerationBackend`] with scripted replies.
//!
//! Replies are queued per [`Operation`] and consumed in order. Every request
//! is recorded, and an operation can be gated so its replies are held until
//! the test releases them.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{GenerationError, GenerationResult};
use crate::generation::{
    GenerationBackend, GenerationRequest, ImageRequest, Operation, PreviewImage, SpeechRequest,
    TextRequest,
};

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReply {
    Text(String),
    Image(Option<PreviewImage>),
    Audio(Option<Vec<u8>>),
    Fail(String),
}

#[derive(Debug, Default)]
struct StubState {
    replies: HashMap<Operation, VecDeque<StubReply>>,
    gates: HashMap<Operation, Arc<Notify>>,
    calls: Vec<GenerationRequest>,
}

/// Scripted backend for tests and offline demos.
#[derive(Debug, Default)]
pub struct StubBackend {
    state: Mutex<StubState>,
}

impl StubBackend {
    /// Creates a backend with no scripted replies. Unscripted calls fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Queue a text reply.
    pub fn with_text(self, operation: Operation, text: impl Into<String>) -> Self {
        self.push(operation, StubReply::Text(text.into()));
        self
    }

    /// Builder: Queue a failure.
    pub fn with_failure(self, operation: Operation, message: impl Into<String>) -> Self {
        self.push(operation, StubReply::Fail(message.into()));
        self
    }

    /// Builder: Queue an image reply.
    pub fn with_image(self, operation: Operation, image: Option<PreviewImage>) -> Self {
        self.push(operation, StubReply::Image(image));
        self
    }

    /// Builder: Queue a speech reply.
    pub fn with_audio(self, operation: Operation, pcm: Option<Vec<u8>>) -> Self {
        self.push(operation, StubReply::Audio(pcm));
        self
    }

    /// Queues a reply for `operation`.
    pub fn push(&self, operation: Operation, reply: StubReply) {
        self.lock()
            .replies
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    /// Holds every later call for `operation` until the returned handle is
    /// notified (one `notify_one` releases one call).
    pub fn gate(&self, operation: Operation) -> Arc<Notify> {
        self.lock()
            .gates
            .entry(operation)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.lock().calls.clone()
    }

    /// Number of requests received for `operation`.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|r| r.operation() == operation)
            .count()
    }

    /// Number of replies still queued for `operation`.
    pub fn pending_replies(&self, operation: Operation) -> usize {
        self.lock().replies.get(&operation).map_or(0, VecDeque::len)
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn reply(&self, request: GenerationRequest) -> GenerationResult<StubReply> {
        let operation = request.operation();
        let (reply, gate) = {
            let mut state = self.lock();
            state.calls.push(request);
            let reply = state
                .replies
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            (reply, state.gates.get(&operation).cloned())
        };
        if let Some(gate) = gate {
            debug!(?operation, "stub call held at gate");
            gate.notified().await;
        }
        match reply {
            Some(StubReply::Fail(message)) => Err(GenerationError::backend(message)),
            Some(reply) => Ok(reply),
            None => Err(GenerationError::backend(format!(
                "no scripted reply for {operation:?}"
            ))),
        }
    }
}

fn mismatch(reply: StubReply) -> GenerationError {
    GenerationError::backend(format!("scripted reply has the wrong modality: {reply:?}"))
}

#[async_trait]
impl GenerationBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_text(&self, request: &TextRequest) -> GenerationResult<String> {
        match self.reply(GenerationRequest::Text(request.clone())).await? {
            StubReply::Text(text) => Ok(text),
            other => Err(mismatch(other)),
        }
    }

    async fn generate_image(&self, request: &ImageRequest) -> GenerationResult<Option<PreviewImage>> {
        match self.reply(GenerationRequest::Image(request.clone())).await? {
            StubReply::Image(image) => Ok(image),
            other => Err(mismatch(other)),
        }
    }

    async fn generate_speech(&self, request: &SpeechRequest) -> GenerationResult<Option<Vec<u8>>> {
        match self.reply(GenerationRequest::Audio(request.clone())).await? {
            StubReply::Audio(pcm) => Ok(pcm),
            other => Err(mismatch(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prompts;
    use crate::generation::GenerationOutput;
    use crate::lang::TranslationDirection;

    #[tokio::test]
    async fn test_replies_in_order_per_operation() {
        let stub = StubBackend::new()
            .with_text(Operation::Translate, "first")
            .with_failure(Operation::Translate, "quota")
            .with_text(Operation::Storyboard, "[]");

        let request = prompts::translate("hi", TranslationDirection::ToChinese);
        assert_eq!(stub.generate_text(&request).await.unwrap(), "first");
        assert!(matches!(
            stub.generate_text(&request).await,
            Err(GenerationError::Backend(m)) if m == "quota"
        ));
        assert!(stub.generate_text(&request).await.is_err(), "queue exhausted");

        assert_eq!(stub.call_count(Operation::Translate), 3);
        assert_eq!(stub.pending_replies(Operation::Storyboard), 1);
    }

    #[tokio::test]
    async fn test_execute_routes_by_modality() {
        let image = PreviewImage::new("image/png", vec![1]);
        let stub = StubBackend::new()
            .with_image(Operation::PreviewImage, Some(image.clone()))
            .with_audio(Operation::Speech, None);

        let output = stub
            .execute(&GenerationRequest::Image(prompts::preview_image("dusk")))
            .await
            .unwrap();
        assert_eq!(output, GenerationOutput::Image(Some(image)));

        let output = stub
            .execute(&GenerationRequest::Audio(prompts::speech("Hello", None)))
            .await
            .unwrap();
        assert_eq!(output, GenerationOutput::Audio(None));
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_modality_is_an_error() {
        let stub = StubBackend::new().with_text(Operation::PreviewImage, "oops");
        let result = stub.generate_image(&prompts::preview_image("dusk")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_gate_holds_calls() {
        let stub = Arc::new(StubBackend::new().with_text(Operation::Translate, "held"));
        let gate = stub.gate(Operation::Translate);

        let worker = {
            let stub = stub.clone();
            tokio::spawn(async move {
                let request = prompts::translate("hi", TranslationDirection::ToChinese);
                stub.generate_text(&request).await
            })
        };

        tokio::task::yield_now().await;
        assert!(!worker.is_finished());
        gate.notify_one();
        assert_eq!(worker.await.unwrap().unwrap(), "held");
    }
}
