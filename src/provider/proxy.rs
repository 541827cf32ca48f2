//! Application-server endpoints: `/api/gpt` for completions and
//! `/api/dall-e` for images.
//!
//! The completion route streams its answer either as raw text or in the
//! line-oriented data-stream protocol (`0:"text"`, `3:"error"`, `d:{...}`).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use super::http::{
    error_from_response, json_headers, shared_client, trim_trailing_slash, LineBuffer, Utf8Buffer,
};
use super::{CompletionProvider, CompletionRequest, CompletionStream, ImageProvider, ImageRequest, ImageResponse};
use crate::config::ProxyStreamFormat;
use crate::error::TweetifyError;
use crate::types::{CompletionDelta, FinishReason, Usage};
use crate::util::timeout::with_timeout;

const COMPLETION_PATH: &str = "/api/gpt";
const IMAGE_PATH: &str = "/api/dall-e";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Completion provider backed by the `/api/gpt` route.
#[derive(Debug, Clone)]
pub struct ProxyCompletionProvider {
    base_url: String,
    format: ProxyStreamFormat,
    timeout: Duration,
}

impl ProxyCompletionProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            format: ProxyStreamFormat::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_format(mut self, format: ProxyStreamFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionProvider for ProxyCompletionProvider {
    fn provider_name(&self) -> &str {
        "proxy"
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, TweetifyError> {
        let url = format!("{}{COMPLETION_PATH}", trim_trailing_slash(&self.base_url));
        let body = serde_json::json!({
            "messages": [{ "role": "user", "content": request.prompt }],
        });

        debug!(url = %url, format = %self.format, "proxy completion");

        let response = with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(json_headers(None))
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }
            Ok(response)
        })
        .await?;

        let byte_stream = response.bytes_stream();
        let format = self.format;

        let stream = async_stream::stream! {
            futures::pin_mut!(byte_stream);
            let mut text_buf = Utf8Buffer::new();
            let mut lines = LineBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(TweetifyError::Network(e));
                        break;
                    }
                };

                match format {
                    ProxyStreamFormat::Text => {
                        let text = text_buf.push(&chunk);
                        if !text.is_empty() {
                            yield Ok(CompletionDelta::text(text));
                        }
                    }
                    ProxyStreamFormat::DataStream => {
                        for line in lines.push(&chunk) {
                            match parse_data_stream_line(&line) {
                                Ok(Some(delta)) => yield Ok(delta),
                                Ok(None) => {}
                                Err(e) => {
                                    yield Err(e);
                                    return;
                                }
                            }
                        }
                    }
                }
            }

            match format {
                ProxyStreamFormat::Text => {
                    let rest = text_buf.finish();
                    if !rest.is_empty() {
                        yield Ok(CompletionDelta::text(rest));
                    }
                }
                ProxyStreamFormat::DataStream => {
                    if let Some(line) = lines.finish() {
                        match parse_data_stream_line(&line) {
                            Ok(Some(delta)) => yield Ok(delta),
                            Ok(None) => {}
                            Err(e) => yield Err(e),
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Parse one data-stream protocol line.
///
/// Returns `Ok(None)` for blank lines and part types that carry no text.
pub(crate) fn parse_data_stream_line(line: &str) -> Result<Option<CompletionDelta>, TweetifyError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some((kind, payload)) = line.split_once(':') else {
        return Err(TweetifyError::Stream(format!("Malformed stream line: {line}")));
    };

    match kind {
        "0" => {
            let text: String = serde_json::from_str(payload)?;
            Ok(Some(CompletionDelta::text(text)))
        }
        "3" => {
            let message: String =
                serde_json::from_str(payload).unwrap_or_else(|_| payload.to_string());
            Err(TweetifyError::Stream(message))
        }
        "d" => {
            let finish: FinishPart = serde_json::from_str(payload)?;
            Ok(Some(CompletionDelta {
                text: String::new(),
                finish_reason: finish.finish_reason.as_deref().and_then(parse_finish_reason),
                usage: finish.usage.map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.prompt_tokens.saturating_add(u.completion_tokens),
                }),
            }))
        }
        _ => Ok(None),
    }
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "content-filter" => Some(FinishReason::ContentFilter),
        "error" => Some(FinishReason::Error),
        other => FinishReason::parse(other),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishPart {
    finish_reason: Option<String>,
    usage: Option<FinishUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Image provider backed by the `/api/dall-e` route.
#[derive(Debug, Clone)]
pub struct ProxyImageProvider {
    base_url: String,
    timeout: Duration,
}

impl ProxyImageProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ImageProvider for ProxyImageProvider {
    fn provider_name(&self) -> &str {
        "proxy"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, TweetifyError> {
        let url = format!("{}{IMAGE_PATH}", trim_trailing_slash(&self.base_url));
        let body = serde_json::json!({ "prompt": request.prompt });

        debug!(url = %url, "proxy image");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .headers(json_headers(None))
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            let bytes = response.bytes().await?;
            let data: ProxyImageBody = serde_json::from_slice(&bytes)?;
            match data.image_url {
                Some(image_url) if !image_url.is_empty() => Ok(ImageResponse {
                    image_url,
                    revised_prompt: None,
                }),
                _ => Err(TweetifyError::api(200, "No imageUrl in image response")),
            }
        })
        .await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyImageBody {
    image_url: Option<String>,
}
