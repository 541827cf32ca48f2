//! Templated social post generation.
//!
//! Collects a topic, tone and character persona, turns them into a prompt,
//! sends it to a completion endpoint, strips hashtags from the answer, and
//! optionally asks an image endpoint to illustrate the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use tweetify::prelude::*;
//!
//! # async fn example() -> tweetify::error::Result<()> {
//! let config = TweetifyConfig::load(None)?;
//! let mut session = Session::from_config(&config)?;
//! session.apply(FormEvent::TopicChanged("cats".into()));
//! session.apply(FormEvent::CharacterChanged(Character::DarthVader));
//!
//! let outcome = session.submit().await?;
//! if outcome.is_success() {
//!     println!("{}", session.content().tweet_text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod pipeline;
pub mod prelude;
pub mod provider;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
