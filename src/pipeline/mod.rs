//! Two-stage submission pipeline: completion, then optional image.
//!
//! [`submit_prompt`] and [`submit_image_request`] are the stateless stages;
//! [`Session`] owns the form and lifecycle state and sequences them.

pub mod session;

pub use session::{
    StageFailure, SubmissionEvent, SubmissionEventSink, SubmissionOutcome, SubmissionPhase,
    SubmissionStage, Session,
};

use futures::StreamExt;
use tracing::debug;

use crate::error::{Result, TweetifyError};
use crate::provider::{
    collect_stream, CompletionProvider, CompletionRequest, ImageProvider, ImageRequest,
};
use crate::types::{CompletionDelta, CompletionResult, ImageResult, ImageStyle};
use crate::util::hashtags::strip_hashtags;

/// Build the image prompt from cleaned text and a style.
pub fn styled_image_prompt(text: &str, style: ImageStyle) -> String {
    format!("{text} in {style} style")
}

/// Send the request's prompt to the completion endpoint and clean the answer.
///
/// With `on_delta`, the completion is streamed and each raw delta is
/// reported as it arrives; otherwise it is fetched in one response.
pub async fn submit_prompt(
    provider: &dyn CompletionProvider,
    request: &CompletionRequest,
    on_delta: Option<&(dyn Fn(&CompletionDelta) + Send + Sync)>,
) -> Result<CompletionResult> {
    if request.prompt.trim().is_empty() {
        return Err(TweetifyError::InvalidArgument(
            "Prompt cannot be empty".into(),
        ));
    }

    let response = match on_delta {
        Some(callback) => {
            let stream = provider.stream(request).await?;
            collect_stream(stream.inspect(|delta| {
                if let Ok(delta) = delta {
                    callback(delta);
                }
            }))
            .await?
        }
        None => provider.complete(request).await?,
    };

    let text = strip_hashtags(&response.text);
    debug!(
        provider = provider.provider_name(),
        raw_len = response.text.len(),
        clean_len = text.len(),
        "completion received"
    );

    Ok(CompletionResult {
        raw_text: response.text,
        text,
        finish_reason: response.finish_reason,
        usage: response.usage,
    })
}

/// Request an image for `text` rendered in `style`.
pub async fn submit_image_request(
    provider: &dyn ImageProvider,
    text: &str,
    style: ImageStyle,
) -> Result<ImageResult> {
    if text.is_empty() {
        return Err(TweetifyError::InvalidArgument(
            "Image prompt text cannot be empty".into(),
        ));
    }

    let prompt = styled_image_prompt(text, style);
    let response = provider
        .generate_image(&ImageRequest {
            prompt: prompt.clone(),
        })
        .await?;

    debug!(provider = provider.provider_name(), "image received");

    Ok(ImageResult {
        prompt,
        image_url: response.image_url,
        revised_prompt: response.revised_prompt,
    })
}
