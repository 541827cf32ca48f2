//! Command-line interface for Tweetify.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Backend, TweetifyConfig};
use crate::error::ErrorCategory;
use crate::form::FormEvent;
use crate::pipeline::SubmissionOutcome;
use crate::types::{Character, ImageStyle, Tone};

/// Tweetify CLI
#[derive(Parser, Debug)]
#[command(name = "tweetify", version, about = "Generate a post in a persona's voice, optionally illustrated")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the prompt that would be sent, without calling any endpoint
    Prompt(FormArgs),
    /// Generate a post (and optionally an image)
    Generate(GenerateArgs),
}

/// Topic, tone and character selections.
#[derive(Args, Debug)]
pub struct FormArgs {
    /// Topic or interest the post is about
    #[arg(long)]
    pub topic: String,

    /// Tone: funny, inspirational, casual
    #[arg(long, default_value_t = Tone::Funny)]
    pub tone: Tone,

    /// Character: DonaldTrump, JimCarrey, NelsonMandela, DarthVader
    #[arg(short, long, default_value_t = Character::DonaldTrump)]
    pub character: Character,
}

impl FormArgs {
    /// Form events in input order; the topic comes last so the prompt
    /// reflects every selection.
    pub fn events(&self) -> Vec<FormEvent> {
        vec![
            FormEvent::ToneChanged(self.tone),
            FormEvent::CharacterChanged(self.character),
            FormEvent::TopicChanged(self.topic.clone()),
        ]
    }
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub form: FormArgs,

    /// Also generate an image from the post
    #[arg(long)]
    pub image: bool,

    /// Image style: realistic, cartoon, abstract, watercolor, digital-art, photographic
    #[arg(long, requires = "image")]
    pub style: Option<ImageStyle>,

    /// Backend: openai or proxy
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Completion model (openai backend)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the selected backend
    #[arg(long)]
    pub base_url: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Wait for the whole completion instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to $TWEETIFY_CONFIG or ~/.tweetify/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl GenerateArgs {
    /// Form events, including the image options.
    pub fn events(&self) -> Vec<FormEvent> {
        let mut events = self.form.events();
        events.push(FormEvent::ImageToggled(self.image));
        if let Some(style) = self.style {
            events.push(FormEvent::ImageStyleChanged(style));
        }
        events
    }

    /// Apply flag overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut TweetifyConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(ref model) = self.model {
            config.completion_model = model.clone();
        }
        if let Some(ref url) = self.base_url {
            match config.backend {
                Backend::OpenAi => config.openai_base_url = url.clone(),
                Backend::Proxy => config.proxy_base_url = Some(url.clone()),
            }
        }
        if self.no_stream {
            config.stream = false;
        }
    }
}

/// Process exit code for a failure category.
pub fn exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Configuration | ErrorCategory::Authentication | ErrorCategory::Input => 2,
        _ => 1,
    }
}

/// Process exit code for a finished cycle: 0 on success, otherwise the
/// code for the failing stage's category.
pub fn outcome_exit_code(outcome: &SubmissionOutcome) -> i32 {
    outcome
        .failure
        .as_ref()
        .map_or(0, |failure| exit_code(failure.category))
}
