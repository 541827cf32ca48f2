//! Streaming types.

use serde::{Deserialize, Serialize};

use super::generation::FinishReason;
use super::usage::Usage;

/// A delta emitted while a completion streams in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionDelta {
    /// The incremental text chunk.
    pub text: String,
    /// Finish reason (only on the final delta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Usage (typically only on the final delta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
            usage: None,
        }
    }
}
