//! Session state container and the submission state machine.
//!
//! One cycle runs `Idle → Submitting → TextReady → (GeneratingImage →) Idle`,
//! or `Idle → Submitting → Failed → Idle`. Stage errors are recorded on the
//! session as a display string and never escape [`Session::submit`].

use std::sync::Arc;

use strum::Display;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{submit_image_request, submit_prompt};
use crate::config::TweetifyConfig;
use crate::error::{ErrorCategory, Result, TweetifyError};
use crate::form::{FormEvent, FormState};
use crate::provider::{
    create_completion_provider, create_image_provider, CompletionProvider, CompletionRequest,
    ImageProvider,
};
use crate::types::{
    CompletionDelta, CompletionResult, GeneratedContent, ImageResult, RequestLifecycle,
};

/// Where a session is in its submission cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    TextReady,
    GeneratingImage,
    Failed,
}

/// Which remote call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionStage {
    Completion,
    Image,
}

/// Progress reported to an event sink during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionEvent {
    PhaseChanged {
        cycle_id: Uuid,
        phase: SubmissionPhase,
        lifecycle: RequestLifecycle,
    },
    TextDelta {
        cycle_id: Uuid,
        text: String,
    },
}

pub type SubmissionEventSink = Arc<dyn Fn(SubmissionEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: SubmissionStage,
    pub category: ErrorCategory,
    /// The message stored in the session's `error_message`.
    pub message: String,
}

/// Summary of one submission cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub cycle_id: Uuid,
    pub completion: Option<CompletionResult>,
    pub image: Option<ImageResult>,
    pub failure: Option<StageFailure>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Form, lifecycle and generated content for one user, plus the providers
/// that serve its submissions.
pub struct Session {
    form: FormState,
    lifecycle: RequestLifecycle,
    content: GeneratedContent,
    phase: SubmissionPhase,
    completion: Arc<dyn CompletionProvider>,
    image: Arc<dyn ImageProvider>,
    stream: bool,
    temperature: Option<f64>,
    event_sink: Option<SubmissionEventSink>,
}

impl Session {
    pub fn new(completion: Arc<dyn CompletionProvider>, image: Arc<dyn ImageProvider>) -> Self {
        Self {
            form: FormState::new(),
            lifecycle: RequestLifecycle::default(),
            content: GeneratedContent::default(),
            phase: SubmissionPhase::Idle,
            completion,
            image,
            stream: false,
            temperature: None,
            event_sink: None,
        }
    }

    /// Build a session with the providers selected by `config`.
    pub fn from_config(config: &TweetifyConfig) -> Result<Self> {
        let completion = create_completion_provider(config)?;
        let image = create_image_provider(config)?;
        Ok(Self::new(completion, image).with_streaming(config.stream))
    }

    /// Stream completions, forwarding raw deltas to the event sink.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_event_sink(mut self, sink: SubmissionEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    pub fn content(&self) -> &GeneratedContent {
        &self.content
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Apply a form input change.
    pub fn apply(&mut self, event: FormEvent) {
        self.form.apply(event);
    }

    /// Run one submission cycle.
    ///
    /// Fails only when there is nothing new to submit; remote errors are
    /// reported through the outcome and the session's `error_message`.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome> {
        if !self.form.can_submit() {
            return Err(TweetifyError::InvalidState(
                "Nothing to submit: change the topic, tone or character first".into(),
            ));
        }

        let cycle_id = Uuid::new_v4();
        let span = info_span!("submission", %cycle_id);
        Ok(self.run_cycle(cycle_id).instrument(span).await)
    }

    async fn run_cycle(&mut self, cycle_id: Uuid) -> SubmissionOutcome {
        let generate_image = self.form.generate_image();
        let style = self.form.image_style();
        let request = CompletionRequest {
            prompt: self.form.prompt().to_string(),
            temperature: self.temperature,
            max_tokens: None,
        };
        self.form.mark_submitted();

        let mut outcome = SubmissionOutcome {
            cycle_id,
            completion: None,
            image: None,
            failure: None,
        };

        self.lifecycle.loading = true;
        self.transition(cycle_id, SubmissionPhase::Submitting);
        info!(
            provider = self.completion.provider_name(),
            generate_image,
            "submitting prompt"
        );

        let sink = self.event_sink.clone();
        let forward = move |delta: &CompletionDelta| {
            if let Some(sink) = &sink {
                sink(SubmissionEvent::TextDelta {
                    cycle_id,
                    text: delta.text.clone(),
                });
            }
        };
        let on_delta: Option<&(dyn Fn(&CompletionDelta) + Send + Sync)> =
            if self.stream { Some(&forward) } else { None };

        let result = submit_prompt(self.completion.as_ref(), &request, on_delta).await;
        let completion = match result {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, "completion failed");
                let message = format!("An error occurred calling the completion endpoint: {e}");
                self.lifecycle.error_message = message.clone();
                self.lifecycle.loading = false;
                outcome.failure = Some(StageFailure {
                    stage: SubmissionStage::Completion,
                    category: e.category(),
                    message,
                });
                self.transition(cycle_id, SubmissionPhase::Failed);
                self.transition(cycle_id, SubmissionPhase::Idle);
                return outcome;
            }
        };

        self.content.tweet_text = completion.text.clone();
        self.lifecycle.error_message.clear();
        self.transition(cycle_id, SubmissionPhase::TextReady);

        if generate_image && !completion.text.is_empty() {
            self.transition(cycle_id, SubmissionPhase::GeneratingImage);
            info!(
                provider = self.image.provider_name(),
                %style,
                "requesting image"
            );
            let result = submit_image_request(self.image.as_ref(), &completion.text, style).await;
            match result {
                Ok(image) => {
                    self.content.image_url = image.image_url.clone();
                    self.lifecycle.error_message.clear();
                    outcome.image = Some(image);
                }
                Err(e) => {
                    warn!(error = %e, "image generation failed");
                    let message = format!("An error occurred calling the image endpoint: {e}");
                    self.lifecycle.error_message = message.clone();
                    outcome.failure = Some(StageFailure {
                        stage: SubmissionStage::Image,
                        category: e.category(),
                        message,
                    });
                }
            }
        }

        outcome.completion = Some(completion);
        self.lifecycle.loading = false;
        self.transition(cycle_id, SubmissionPhase::Idle);
        outcome
    }

    fn transition(&mut self, cycle_id: Uuid, phase: SubmissionPhase) {
        debug!(from = %self.phase, to = %phase, loading = self.lifecycle.loading, "phase change");
        self.phase = phase;
        if let Some(sink) = &self.event_sink {
            sink(SubmissionEvent::PhaseChanged {
                cycle_id,
                phase,
                lifecycle: self.lifecycle.clone(),
            });
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("form", &self.form)
            .field("lifecycle", &self.lifecycle)
            .field("content", &self.content)
            .field("phase", &self.phase)
            .field("completion", &self.completion.provider_name())
            .field("image", &self.image.provider_name())
            .field("stream", &self.stream)
            .finish()
    }
}
