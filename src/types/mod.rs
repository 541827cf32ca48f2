//! Core types shared by the form, providers and session.

pub mod form;
pub mod generation;
pub mod lifecycle;
pub mod stream;
pub mod usage;

pub use form::{Character, ImageStyle, Tone};
pub use generation::{CompletionResult, FinishReason, ImageResult};
pub use lifecycle::{GeneratedContent, RequestLifecycle};
pub use stream::CompletionDelta;
pub use usage::Usage;
