//! Shared test helpers: scripted completion and image providers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tweetify::error::TweetifyError;
use tweetify::pipeline::SubmissionEvent;
use tweetify::provider::{
    CompletionProvider, CompletionRequest, CompletionStream, ImageProvider, ImageRequest,
    ImageResponse,
};
use tweetify::types::{CompletionDelta, FinishReason};

/// A completion provider that replays queued replies and records prompts.
pub struct MockCompletionProvider {
    replies: Mutex<VecDeque<Result<String, TweetifyError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn queue_text(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn queue_error(&self, error: TweetifyError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<String, TweetifyError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, TweetifyError> {
        let text = self.next_reply(request)?;
        let stream = async_stream::stream! {
            for chunk in text.chars().collect::<Vec<_>>().chunks(5) {
                yield Ok::<_, TweetifyError>(CompletionDelta::text(chunk.iter().collect::<String>()));
            }
            yield Ok(CompletionDelta {
                text: String::new(),
                finish_reason: Some(FinishReason::Stop),
                usage: None,
            });
        };
        Ok(Box::pin(stream))
    }
}

/// An image provider that replays queued replies and records prompts.
pub struct MockImageProvider {
    replies: Mutex<VecDeque<Result<String, TweetifyError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockImageProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn queue_url(&self, url: &str) {
        self.replies.lock().unwrap().push_back(Ok(url.to_string()));
    }

    pub fn queue_error(&self, error: TweetifyError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, TweetifyError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let url = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("https://images.test/default.png".to_string()))?;
        Ok(ImageResponse {
            image_url: url,
            revised_prompt: None,
        })
    }
}

/// Collects every event a session emits.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<SubmissionEvent>>>,
}

impl EventRecorder {
    pub fn sink(&self) -> tweetify::pipeline::SubmissionEventSink {
        let events = Arc::clone(&self.events);
        Arc::new(move |event| events.lock().unwrap().push(event))
    }

    pub fn events(&self) -> Vec<SubmissionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Phases with the `loading` flag seen at each transition.
    pub fn phases(&self) -> Vec<(tweetify::pipeline::SubmissionPhase, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SubmissionEvent::PhaseChanged {
                    phase, lifecycle, ..
                } => Some((phase, lifecycle.loading)),
                SubmissionEvent::TextDelta { .. } => None,
            })
            .collect()
    }

    pub fn streamed_text(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SubmissionEvent::TextDelta { text, .. } => Some(text),
                SubmissionEvent::PhaseChanged { .. } => None,
            })
            .collect()
    }
}
