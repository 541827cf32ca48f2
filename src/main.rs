//! Tweetify CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tweetify::cli::{exit_code, outcome_exit_code, Cli, Commands, FormArgs, GenerateArgs};
use tweetify::config::TweetifyConfig;
use tweetify::error::TweetifyError;
use tweetify::form::FormState;
use tweetify::pipeline::{Session, SubmissionEvent, SubmissionPhase};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Prompt(args) => handle_prompt(args),
        Commands::Generate(args) => handle_generate(args).await,
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(exit_code(e.category()));
        }
    }
}

fn handle_prompt(args: FormArgs) -> Result<i32, TweetifyError> {
    let mut form = FormState::new();
    for event in args.events() {
        form.apply(event);
    }
    println!("{}", form.prompt());
    Ok(0)
}

async fn handle_generate(args: GenerateArgs) -> Result<i32, TweetifyError> {
    let mut config = TweetifyConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    // Raw deltas and progress go to stderr; stdout only carries the result.
    let sink = Arc::new(|event: SubmissionEvent| match event {
        SubmissionEvent::TextDelta { text, .. } => {
            eprint!("{text}");
            let _ = std::io::stderr().flush();
        }
        SubmissionEvent::PhaseChanged {
            phase: SubmissionPhase::GeneratingImage,
            ..
        } => eprintln!("\nGenerating image..."),
        SubmissionEvent::PhaseChanged { .. } => {}
    });

    let mut session = Session::from_config(&config)?
        .with_temperature(args.temperature)
        .with_event_sink(sink);
    for event in args.events() {
        session.apply(event);
    }

    let outcome = session.submit().await?;
    if config.stream {
        eprintln!();
    }

    let content = session.content();
    if args.json {
        let body = serde_json::json!({
            "cycle_id": outcome.cycle_id.to_string(),
            "prompt": session.form().prompt(),
            "tweet_text": content.tweet_text,
            "image_url": content.image_url,
            "image_prompt": outcome.image.as_ref().map(|i| i.prompt.clone()),
            "error_message": session.lifecycle().error_message,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        if content.has_tweet() {
            println!("{}", content.tweet_text);
        }
        if content.has_image() {
            println!("{}", content.image_url);
        }
    }

    if let Some(failure) = &outcome.failure {
        eprintln!("{}", failure.message);
    }
    Ok(outcome_exit_code(&outcome))
}
