//! Form selections: tone, character persona and image style.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Tone of the generated post.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tone {
    #[default]
    Funny,
    Inspirational,
    Casual,
}

/// Persona whose voice the post imitates.
///
/// `Display` yields the identifier interpolated into the prompt
/// (e.g. `DarthVader`); parsing also accepts the kebab-case form.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Character {
    #[default]
    #[strum(to_string = "DonaldTrump", serialize = "donald-trump")]
    DonaldTrump,
    #[strum(to_string = "JimCarrey", serialize = "jim-carrey")]
    JimCarrey,
    #[strum(to_string = "NelsonMandela", serialize = "nelson-mandela")]
    NelsonMandela,
    #[strum(to_string = "DarthVader", serialize = "darth-vader")]
    DarthVader,
}

impl Character {
    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::DonaldTrump => "Donald Trump",
            Self::JimCarrey => "Jim Carrey",
            Self::NelsonMandela => "Nelson Mandela",
            Self::DarthVader => "Darth Vader",
        }
    }
}

/// Visual style appended to the image prompt.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ImageStyle {
    #[default]
    Realistic,
    Cartoon,
    Abstract,
    Watercolor,
    DigitalArt,
    Photographic,
}
