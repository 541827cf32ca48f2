//! Results of the completion and image stages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::usage::Usage;

/// Why a completion finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            "content_filter" => Some(Self::ContentFilter),
            _ => None,
        }
    }
}

/// Output of the completion stage, consumed by the image stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    /// Text as returned by the endpoint.
    pub raw_text: String,
    /// Text with hashtag tokens removed.
    pub text: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
}

/// Output of the image stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    /// Prompt actually sent, including the style suffix.
    pub prompt: String,
    pub image_url: String,
    /// Prompt as rewritten by the image model, when reported.
    pub revised_prompt: Option<String>,
}
