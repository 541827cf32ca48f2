//! Configuration system (layered: defaults < TOML file < env < explicit overrides).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::{Result, TweetifyError};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which pair of endpoints serves completions and images.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// OpenAI chat completions and image generation APIs.
    #[default]
    OpenAi,
    /// An application server exposing `/api/gpt` and `/api/dall-e`.
    Proxy,
}

/// Body encoding of the proxy completion stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ProxyStreamFormat {
    /// Raw text chunks.
    #[default]
    Text,
    /// `0:"chunk"` lines, `3:"error"` lines.
    DataStream,
}

/// Resolved configuration.
///
/// ```
/// use tweetify::config::{Backend, TweetifyConfig};
///
/// let config = TweetifyConfig::builder()
///     .backend(Backend::Proxy)
///     .proxy_base_url("http://localhost:3000")
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TweetifyConfig {
    #[builder(default)]
    pub backend: Backend,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_OPENAI_BASE_URL.to_string())]
    pub openai_base_url: String,
    #[builder(into)]
    pub proxy_base_url: Option<String>,
    #[builder(default)]
    pub proxy_stream_format: ProxyStreamFormat,
    #[builder(into, default = DEFAULT_COMPLETION_MODEL.to_string())]
    pub completion_model: String,
    #[builder(into, default = DEFAULT_IMAGE_MODEL.to_string())]
    pub image_model: String,
    #[builder(into, default = DEFAULT_IMAGE_SIZE.to_string())]
    pub image_size: String,
    #[builder(default = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    #[builder(default = true)]
    pub stream: bool,
}

impl fmt::Debug for TweetifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweetifyConfig")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("proxy_base_url", &self.proxy_base_url)
            .field("proxy_stream_format", &self.proxy_stream_format)
            .field("completion_model", &self.completion_model)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("stream", &self.stream)
            .finish()
    }
}

impl Default for TweetifyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TweetifyConfig {
    /// Load the full layered configuration.
    ///
    /// The file is `explicit_path` if given, else `$TWEETIFY_CONFIG`, else
    /// `~/.tweetify/config.toml` when it exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::load_with(explicit_path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) without `.env`, reading variables from `lookup`.
    pub fn load_with<F>(explicit_path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None => lookup("TWEETIFY_CONFIG")
                .map(PathBuf::from)
                .or_else(|| Self::default_path().filter(|p| p.exists())),
        };

        let mut config = match path {
            Some(ref p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_from(lookup)?;
        Ok(config)
    }

    /// `~/.tweetify/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".tweetify").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TWEETIFY_BACKEND") {
            self.backend = parse_env("TWEETIFY_BACKEND", &v)?;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.openai_base_url = v;
        }
        if let Some(v) = lookup("TWEETIFY_PROXY_URL") {
            self.proxy_base_url = Some(v);
        }
        if let Some(v) = lookup("TWEETIFY_PROXY_STREAM_FORMAT") {
            self.proxy_stream_format = parse_env("TWEETIFY_PROXY_STREAM_FORMAT", &v)?;
        }
        if let Some(v) = lookup("TWEETIFY_COMPLETION_MODEL") {
            self.completion_model = v;
        }
        if let Some(v) = lookup("TWEETIFY_IMAGE_MODEL") {
            self.image_model = v;
        }
        if let Some(v) = lookup("TWEETIFY_IMAGE_SIZE") {
            self.image_size = v;
        }
        if let Some(v) = lookup("TWEETIFY_TIMEOUT_SECS") {
            self.timeout_secs = parse_env("TWEETIFY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("TWEETIFY_STREAM") {
            self.stream = parse_env("TWEETIFY_STREAM", &v)?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the selected backend has what it needs.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(TweetifyError::Configuration(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        match self.backend {
            Backend::OpenAi => {
                if self.openai_base_url.trim().is_empty() {
                    return Err(TweetifyError::Configuration(
                        "openai_base_url cannot be empty".into(),
                    ));
                }
                if self.completion_model.trim().is_empty() || self.image_model.trim().is_empty() {
                    return Err(TweetifyError::Configuration(
                        "model names cannot be empty".into(),
                    ));
                }
            }
            Backend::Proxy => {
                let missing = self
                    .proxy_base_url
                    .as_deref()
                    .map(|u| u.trim().is_empty())
                    .unwrap_or(true);
                if missing {
                    return Err(TweetifyError::Configuration(
                        "proxy backend requires proxy_base_url (TWEETIFY_PROXY_URL)".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TweetifyError::Configuration(format!("Invalid value for {key}: '{value}'")))
}
