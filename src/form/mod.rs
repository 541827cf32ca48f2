//! Form state and prompt derivation.
//!
//! Every change to the topic, tone or character rebuilds the prompt from the
//! latest value of all three fields and enables submission. Image options
//! never touch the prompt.

use serde::Serialize;
use tracing::trace;

use crate::types::{Character, ImageStyle, Tone};

/// Build the completion prompt for a tone, character and topic.
///
/// ```
/// use tweetify::form::build_prompt;
/// use tweetify::types::{Character, Tone};
///
/// let prompt = build_prompt(Tone::Funny, Character::DarthVader, "cats");
/// assert_eq!(prompt, "Generate a funny post in the style of DarthVader about cats.");
/// ```
pub fn build_prompt(tone: Tone, character: Character, topic: &str) -> String {
    format!("Generate a {tone} post in the style of {character} about {topic}.")
}

/// A single user input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    TopicChanged(String),
    ToneChanged(Tone),
    CharacterChanged(Character),
    ImageToggled(bool),
    ImageStyleChanged(ImageStyle),
}

impl FormEvent {
    /// Whether this event feeds into the prompt template.
    pub fn affects_prompt(&self) -> bool {
        matches!(
            self,
            Self::TopicChanged(_) | Self::ToneChanged(_) | Self::CharacterChanged(_)
        )
    }
}

/// User selections plus the derived prompt buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    topic_text: String,
    tone: Tone,
    character: Character,
    generate_image: bool,
    image_style: ImageStyle,
    submit_enabled: bool,
    prompt: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        Self {
            topic_text: String::new(),
            tone: Tone::default(),
            character: Character::default(),
            generate_image: false,
            image_style: ImageStyle::default(),
            submit_enabled: false,
            prompt: String::new(),
        }
    }

    /// Apply one input change.
    pub fn apply(&mut self, event: FormEvent) {
        let rebuild = event.affects_prompt();
        match event {
            FormEvent::TopicChanged(topic) => self.topic_text = topic,
            FormEvent::ToneChanged(tone) => self.tone = tone,
            FormEvent::CharacterChanged(character) => self.character = character,
            FormEvent::ImageToggled(enabled) => {
                self.generate_image = enabled;
                if !enabled {
                    self.image_style = ImageStyle::default();
                }
            }
            FormEvent::ImageStyleChanged(style) => self.image_style = style,
        }

        if rebuild {
            self.prompt = build_prompt(self.tone, self.character, &self.topic_text);
            self.submit_enabled = true;
            trace!(prompt = %self.prompt, "form prompt rebuilt");
        }
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.apply(FormEvent::TopicChanged(topic.into()));
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.apply(FormEvent::ToneChanged(tone));
    }

    pub fn set_character(&mut self, character: Character) {
        self.apply(FormEvent::CharacterChanged(character));
    }

    pub fn set_generate_image(&mut self, enabled: bool) {
        self.apply(FormEvent::ImageToggled(enabled));
    }

    pub fn set_image_style(&mut self, style: ImageStyle) {
        self.apply(FormEvent::ImageStyleChanged(style));
    }

    /// True when a prompt is ready and has changed since the last submission.
    pub fn can_submit(&self) -> bool {
        self.submit_enabled && !self.prompt.is_empty()
    }

    /// Disable submission until the next prompt-affecting change.
    pub fn mark_submitted(&mut self) {
        self.submit_enabled = false;
    }

    pub fn topic_text(&self) -> &str {
        &self.topic_text
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn character(&self) -> Character {
        self.character
    }

    pub fn generate_image(&self) -> bool {
        self.generate_image
    }

    pub fn image_style(&self) -> ImageStyle {
        self.image_style
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// The derived prompt; empty until the first prompt-affecting change.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}
