//! Convenience re-exports for common use.

pub use crate::config::{Backend, TweetifyConfig};
pub use crate::error::{Result, TweetifyError};
pub use crate::form::{build_prompt, FormEvent, FormState};
pub use crate::pipeline::{Session, SubmissionEvent, SubmissionOutcome, SubmissionPhase};
pub use crate::provider::{CompletionProvider, ImageProvider};
pub use crate::types::{
    Character, CompletionResult, GeneratedContent, ImageResult, ImageStyle, RequestLifecycle,
    Tone,
};
