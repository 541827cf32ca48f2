//! Completion and image provider traits and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "proxy")]
pub mod proxy;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::config::{Backend, TweetifyConfig};
use crate::error::TweetifyError;
use crate::types::{CompletionDelta, FinishReason, Usage};

/// A prompt sent to a completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// A full (non-streamed) completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
}

/// A prompt sent to an image endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
}

/// The generated image location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub image_url: String,
    pub revised_prompt: Option<String>,
}

pub type CompletionStream = BoxStream<'static, Result<CompletionDelta, TweetifyError>>;

/// A text-completion endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "proxy").
    fn provider_name(&self) -> &str;

    /// Stream the completion as text deltas.
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, TweetifyError>;

    /// Receive the whole completion. Defaults to collecting [`Self::stream`].
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, TweetifyError> {
        let stream = self.stream(request).await?;
        collect_stream(stream).await
    }
}

/// An image-generation endpoint.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, TweetifyError>;
}

/// Collect a completion stream into a single response.
pub async fn collect_stream<S>(mut stream: S) -> Result<CompletionResponse, TweetifyError>
where
    S: Stream<Item = Result<CompletionDelta, TweetifyError>> + Unpin,
{
    let mut text = String::new();
    let mut usage = None;
    let mut finish_reason = None;

    while let Some(delta) = stream.next().await {
        let delta = delta?;
        text.push_str(&delta.text);
        if delta.usage.is_some() {
            usage = delta.usage;
        }
        if delta.finish_reason.is_some() {
            finish_reason = delta.finish_reason;
        }
    }

    Ok(CompletionResponse {
        text,
        finish_reason,
        usage,
    })
}

/// Create the completion provider selected by `config`.
pub fn create_completion_provider(
    config: &TweetifyConfig,
) -> Result<Arc<dyn CompletionProvider>, TweetifyError> {
    config.validate()?;
    match config.backend {
        #[cfg(feature = "openai")]
        Backend::OpenAi => {
            let api_key = require_api_key(config)?;
            Ok(Arc::new(
                openai::OpenAiCompletionProvider::new(api_key, config.completion_model.clone())
                    .with_base_url(config.openai_base_url.clone())
                    .with_timeout(config.timeout()),
            ))
        }
        #[cfg(feature = "proxy")]
        Backend::Proxy => Ok(Arc::new(
            proxy::ProxyCompletionProvider::new(proxy_url(config)?)
                .with_format(config.proxy_stream_format)
                .with_timeout(config.timeout()),
        )),
        #[allow(unreachable_patterns)]
        other => Err(TweetifyError::Configuration(format!(
            "Backend '{other}' is not enabled in this build"
        ))),
    }
}

/// Create the image provider selected by `config`.
pub fn create_image_provider(
    config: &TweetifyConfig,
) -> Result<Arc<dyn ImageProvider>, TweetifyError> {
    config.validate()?;
    match config.backend {
        #[cfg(feature = "openai")]
        Backend::OpenAi => {
            let api_key = require_api_key(config)?;
            Ok(Arc::new(
                openai::OpenAiImageProvider::new(api_key, config.image_model.clone())
                    .with_base_url(config.openai_base_url.clone())
                    .with_size(config.image_size.clone())
                    .with_timeout(config.timeout()),
            ))
        }
        #[cfg(feature = "proxy")]
        Backend::Proxy => Ok(Arc::new(
            proxy::ProxyImageProvider::new(proxy_url(config)?).with_timeout(config.timeout()),
        )),
        #[allow(unreachable_patterns)]
        other => Err(TweetifyError::Configuration(format!(
            "Backend '{other}' is not enabled in this build"
        ))),
    }
}

#[cfg(feature = "openai")]
fn require_api_key(config: &TweetifyConfig) -> Result<String, TweetifyError> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| TweetifyError::Authentication("Missing OPENAI_API_KEY".into()))
}

#[cfg(feature = "proxy")]
fn proxy_url(config: &TweetifyConfig) -> Result<String, TweetifyError> {
    config
        .proxy_base_url
        .clone()
        .ok_or_else(|| TweetifyError::Configuration("Missing proxy_base_url".into()))
}
