//! Utility modules: hashtag stripping, timeout.

pub mod hashtags;
pub mod timeout;
