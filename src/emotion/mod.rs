//! Emotional classification of audio features.
//!
//! Audio features are mapped to one of nine [`EmotionalState`]s (optionally
//! blended with a second one), an intensity, a legacy color temperature and a
//! context-adjusted [`EnhancementPreset`](crate::preset::EnhancementPreset).

mod classifier;
mod states;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enhance::OklabProcessingResult;
use crate::error::Error;
use crate::preset::EnhancementPreset;
use crate::variables::VariableMap;

pub use classifier::{EmotionalStateClassifier, StateSelection};
pub use states::{genre_override, EmotionCharacteristics, GenreOverride, GENRE_OVERRIDES};

/// Closed set of emotional states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    /// Low energy, positive.
    Calm,
    /// Low energy, negative.
    Melancholy,
    /// High energy, positive, danceable.
    Energetic,
    /// Very high energy, negative.
    Aggressive,
    /// High energy, positive.
    Happy,
    /// Low energy, moderately positive.
    Romantic,
    /// Moderate energy, ambiguous valence.
    Mysterious,
    /// High energy, dramatic.
    Epic,
    /// Very low energy, textural.
    Ambient,
}

impl EmotionalState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Calm,
        Self::Melancholy,
        Self::Energetic,
        Self::Aggressive,
        Self::Happy,
        Self::Romantic,
        Self::Mysterious,
        Self::Epic,
        Self::Ambient,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Melancholy => "melancholy",
            Self::Energetic => "energetic",
            Self::Aggressive => "aggressive",
            Self::Happy => "happy",
            Self::Romantic => "romantic",
            Self::Mysterious => "mysterious",
            Self::Epic => "epic",
            Self::Ambient => "ambient",
        }
    }

    /// Fixed configuration for this state.
    #[must_use]
    pub fn characteristics(self) -> &'static EmotionCharacteristics {
        match self {
            Self::Calm => &states::CALM,
            Self::Melancholy => &states::MELANCHOLY,
            Self::Energetic => &states::ENERGETIC,
            Self::Aggressive => &states::AGGRESSIVE,
            Self::Happy => &states::HAPPY,
            Self::Romantic => &states::ROMANTIC,
            Self::Mysterious => &states::MYSTERIOUS,
            Self::Epic => &states::EPIC,
            Self::Ambient => &states::AMBIENT,
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionalState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownEmotionalState(s.to_string()))
    }
}

/// Output of [`EmotionalStateClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionalTemperatureResult {
    /// Dominant state.
    pub primary: EmotionalState,
    /// Blended-in state, if any.
    pub secondary: Option<EmotionalState>,
    /// Intensity, soft range [0.1, 1.5].
    pub intensity: f64,
    /// Legacy color temperature in Kelvin.
    pub temperature: f64,
    /// Weight of the primary state; 1.0 when there is no secondary.
    pub blend_ratio: f64,
    /// Context-adjusted preset.
    pub preset: EnhancementPreset,
    /// Enhancement of the primary state's base color, when it succeeded.
    pub oklab_result: Option<OklabProcessingResult>,
    /// Representative color; the unmodified base hex if enhancement failed.
    pub perceptual_hex: Option<String>,
    /// Flat variables for the presentation layer.
    pub variables: VariableMap,
}

impl EmotionalTemperatureResult {
    /// Neutral `calm` result used by the coordinator's fallback path.
    #[must_use]
    pub fn neutral() -> Self {
        classifier::neutral_result()
    }

    /// Warmth label derived from the temperature.
    #[must_use]
    pub fn warmth(&self) -> &'static str {
        warmth_label(self.temperature)
    }
}

/// `warm` below 4000K, `cool` above 7000K, `neutral` otherwise.
#[must_use]
pub fn warmth_label(temperature: f64) -> &'static str {
    if temperature < 4000.0 {
        "warm"
    } else if temperature > 7000.0 {
        "cool"
    } else {
        "neutral"
    }
}
