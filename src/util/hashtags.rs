//! Hashtag removal for generated posts.

use std::sync::OnceLock;

use regex::Regex;

static HASHTAG: OnceLock<Regex> = OnceLock::new();

fn hashtag_regex() -> &'static Regex {
    HASHTAG.get_or_init(|| Regex::new(r"#[A-Za-z0-9_]+").expect("hashtag pattern is valid"))
}

/// Remove every `#word` token, where word characters are ASCII
/// `[A-Za-z0-9_]`. Surrounding whitespace is left as-is.
pub fn strip_hashtags(text: &str) -> String {
    hashtag_regex().replace_all(text, "").into_owned()
}
