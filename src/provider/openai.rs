//! OpenAI providers: Chat Completions (`/chat/completions`) and image
//! generation (`/images/generations`).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use super::http::{
    error_from_response, json_headers, parse_sse_data, shared_client, trim_trailing_slash,
    LineBuffer,
};
use super::{
    CompletionProvider, CompletionRequest, CompletionResponse, CompletionStream, ImageProvider,
    ImageRequest, ImageResponse,
};
use crate::config::{DEFAULT_IMAGE_SIZE, DEFAULT_OPENAI_BASE_URL};
use crate::error::TweetifyError;
use crate::types::{CompletionDelta, FinishReason, Usage};
use crate::util::timeout::with_timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI Chat Completions provider.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionProvider {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompletionProvider {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", trim_trailing_slash(&self.base_url))
    }

    fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "stream": stream,
        });

        if let Some(obj) = body.as_object_mut() {
            if stream {
                obj.insert(
                    "stream_options".into(),
                    serde_json::json!({ "include_usage": true }),
                );
            }
            if let Some(max) = request.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(temp) = request.temperature {
                obj.insert("temperature".into(), temp.into());
            }
        }

        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response, TweetifyError> {
        let url = self.url();
        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(json_headers(Some(self.api_key.as_str())))
                .json(body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }
            Ok(response)
        })
        .await
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, TweetifyError> {
        let body = self.build_request_body(request, false);
        debug!(model = %self.model, "OpenAI complete");

        let response = self.send(&body).await?;
        let bytes = response.bytes().await?;
        let data: ChatResponse = serde_json::from_slice(&bytes)?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TweetifyError::api(200, "No choices in OpenAI response"))?;

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::parse),
            usage: data.usage.map(Usage::from),
        })
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, TweetifyError> {
        let body = self.build_request_body(request, true);
        debug!(model = %self.model, "OpenAI stream");

        let response = self.send(&body).await?;
        let byte_stream = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut lines = LineBuffer::new();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(TweetifyError::Network(e));
                        break;
                    }
                };

                for line in lines.push(&chunk) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = parse_sse_data(line) else {
                        continue;
                    };
                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(delta) = chunk.into_delta() {
                                yield Ok(delta);
                            }
                        }
                        Err(e) => debug!(error = %e, "skipping unparseable OpenAI stream chunk"),
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// OpenAI image generation provider.
#[derive(Debug, Clone)]
pub struct OpenAiImageProvider {
    api_key: String,
    base_url: String,
    model: String,
    size: String,
    timeout: Duration,
}

impl OpenAiImageProvider {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, TweetifyError> {
        let url = format!(
            "{}/images/generations",
            trim_trailing_slash(&self.base_url)
        );
        let body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "n": 1,
            "size": self.size,
        });

        debug!(model = %self.model, size = %self.size, "OpenAI generate_image");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(json_headers(Some(self.api_key.as_str())))
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            let bytes = response.bytes().await?;
            let data: ImagesResponse = serde_json::from_slice(&bytes)?;
            let image = data
                .data
                .into_iter()
                .find(|d| d.url.as_deref().is_some_and(|u| !u.is_empty()))
                .ok_or_else(|| TweetifyError::api(200, "No image URL in OpenAI response"))?;

            Ok(ImageResponse {
                image_url: image.url.unwrap_or_default(),
                revised_prompt: image.revised_prompt,
            })
        })
        .await
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for Usage {
    fn from(u: OpenAiUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl StreamChunk {
    fn into_delta(self) -> Option<CompletionDelta> {
        let usage = self.usage.map(Usage::from);
        match self.choices.into_iter().next() {
            Some(choice) => Some(CompletionDelta {
                text: choice.delta.content.unwrap_or_default(),
                finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::parse),
                usage,
            }),
            // Final usage-only chunk when `include_usage` is set.
            None => usage.map(|usage| CompletionDelta {
                text: String::new(),
                finish_reason: None,
                usage: Some(usage),
            }),
        }
    }
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
    revised_prompt: Option<String>,
}
