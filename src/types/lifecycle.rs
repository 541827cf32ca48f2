//! Per-session request lifecycle and generated content.

use serde::Serialize;

/// Loading flag and the last user-facing error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestLifecycle {
    pub loading: bool,
    /// Empty when there is no error.
    pub error_message: String,
}

impl RequestLifecycle {
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

/// Content produced by the two remote calls. Empty string means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
    pub tweet_text: String,
    pub image_url: String,
}

impl GeneratedContent {
    pub fn has_tweet(&self) -> bool {
        !self.tweet_text.is_empty()
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}
