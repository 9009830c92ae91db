//! Genre detection seam.
//!
//! The coordinator talks to genre detection only through [`GenreClassifier`].
//! [`HeuristicGenreClassifier`] is the built-in implementation: it trusts an
//! explicit genre label when it knows it, otherwise guesses from features.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::music::MusicAnalysisData;
use crate::preset::EnhancementPreset;

/// Genre reported when nothing better is known.
pub const DEFAULT_GENRE: &str = "default";

/// How saturated a genre's palette should feel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrancyLevel {
    /// Desaturated, restrained.
    Low,
    /// Balanced.
    Medium,
    /// Saturated.
    High,
    /// As loud as it gets.
    Extreme,
}

/// Breadth of moods typical of a genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalRange {
    /// Mostly one mood.
    Narrow,
    /// Some variation.
    Moderate,
    /// Anything goes.
    Wide,
}

/// Color temperature label of a genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTemperature {
    /// Reds, oranges, yellows.
    Warm,
    /// Neither.
    Neutral,
    /// Blues, cyans, violets.
    Cool,
}

macro_rules! label_display {
    ($($ty:ty { $($variant:ident => $label:literal),+ $(,)? })+) => {
        $(
            impl $ty {
                /// Lowercase label.
                #[must_use]
                pub const fn as_str(self) -> &'static str {
                    match self {
                        $(Self::$variant => $label),+
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

label_display! {
    VibrancyLevel { Low => "low", Medium => "medium", High => "high", Extreme => "extreme" }
    EmotionalRange { Narrow => "narrow", Moderate => "moderate", Wide => "wide" }
    ColorTemperature { Warm => "warm", Neutral => "neutral", Cool => "cool" }
}

/// Descriptor of how a genre tends to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreCharacteristics {
    /// Palette saturation.
    pub vibrancy_level: VibrancyLevel,
    /// Mood breadth.
    pub emotional_range: EmotionalRange,
    /// Warm/cool bias.
    pub color_temperature: ColorTemperature,
}

impl Default for GenreCharacteristics {
    fn default() -> Self {
        Self {
            vibrancy_level: VibrancyLevel::Medium,
            emotional_range: EmotionalRange::Moderate,
            color_temperature: ColorTemperature::Neutral,
        }
    }
}

/// External genre classifier.
pub trait GenreClassifier: Send + Sync {
    /// Genre name, or [`DEFAULT_GENRE`].
    fn detect_genre(&self, music: &MusicAnalysisData) -> Result<String>;

    /// Preset suited to the track's genre.
    fn preset_for_track(&self, music: &MusicAnalysisData) -> Result<EnhancementPreset>;

    /// Descriptor for a genre previously returned by [`detect_genre`](Self::detect_genre).
    fn color_characteristics(&self, genre: &str) -> Result<GenreCharacteristics>;
}

/// Lowercase and strip separators: `"Hip-Hop"` → `"hiphop"`, `"Drum & Bass"` → `"drumandbass"`.
#[must_use]
pub fn normalize_genre(genre: &str) -> String {
    genre
        .trim()
        .to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '/' | '.' | '\''))
        .collect()
}

struct GenreProfile {
    genre: &'static str,
    preset: EnhancementPreset,
    characteristics: GenreCharacteristics,
}

const fn profile(
    genre: &'static str,
    preset: EnhancementPreset,
    vibrancy_level: VibrancyLevel,
    emotional_range: EmotionalRange,
    color_temperature: ColorTemperature,
) -> GenreProfile {
    GenreProfile {
        genre,
        preset,
        characteristics: GenreCharacteristics { vibrancy_level, emotional_range, color_temperature },
    }
}

/// Normalized genre key → preset and characteristics.
static PROFILES: &[GenreProfile] = {
    use ColorTemperature::{Cool, Neutral, Warm};
    use EmotionalRange::{Moderate, Narrow, Wide};
    use VibrancyLevel::{Extreme, High, Low, Medium};
    &[
        profile("ambient", EnhancementPreset::SUBTLE, Low, Narrow, Cool),
        profile("blues", EnhancementPreset::STANDARD, Medium, Moderate, Cool),
        profile("classical", EnhancementPreset::SUBTLE, Low, Wide, Neutral),
        profile("country", EnhancementPreset::STANDARD, Medium, Moderate, Warm),
        profile("electronic", EnhancementPreset::VIBRANT, High, Wide, Cool),
        profile("folk", EnhancementPreset::SUBTLE, Low, Moderate, Warm),
        profile("hiphop", EnhancementPreset::VIBRANT, High, Moderate, Warm),
        profile("jazz", EnhancementPreset::STANDARD, Medium, Wide, Warm),
        profile("metal", EnhancementPreset::COSMIC, Extreme, Narrow, Warm),
        profile("pop", EnhancementPreset::VIBRANT, High, Moderate, Warm),
        profile("punk", EnhancementPreset::VIBRANT, Extreme, Narrow, Warm),
        profile("rnb", EnhancementPreset::STANDARD, Medium, Moderate, Warm),
        profile("rock", EnhancementPreset::VIBRANT, High, Moderate, Neutral),
        profile("soul", EnhancementPreset::STANDARD, Medium, Moderate, Warm),
        profile("soundtrack", EnhancementPreset::COSMIC, Medium, Wide, Neutral),
        profile("techno", EnhancementPreset::COSMIC, High, Narrow, Cool),
    ]
};

/// Aliases folded onto [`PROFILES`] keys.
const ALIASES: &[(&str, &str)] = &[
    ("drumandbass", "electronic"),
    ("edm", "electronic"),
    ("dance", "electronic"),
    ("house", "electronic"),
    ("rap", "hiphop"),
    ("randb", "rnb"),
    ("heavymetal", "metal"),
    ("lofi", "ambient"),
    ("score", "soundtrack"),
    ("orchestral", "classical"),
];

fn profile_for(genre: &str) -> Option<&'static GenreProfile> {
    let key = normalize_genre(genre);
    let key = ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key.as_str(), |&(_, canonical)| canonical);
    PROFILES.iter().find(|p| p.genre == key)
}

/// Table-driven classifier with feature heuristics as a last resort.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicGenreClassifier;

impl HeuristicGenreClassifier {
    /// Create the classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Only features that were actually supplied count; neutral defaults would
    /// otherwise trip the speechiness and acousticness rules.
    fn guess_from_features(music: &MusicAnalysisData) -> &'static str {
        if !music.has_core_features() {
            return DEFAULT_GENRE;
        }
        let f = music.resolve();
        let supplied = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(0.0);
        let speechiness = supplied(music.speechiness);
        let instrumentalness = supplied(music.instrumentalness);
        let acousticness = supplied(music.acousticness);
        let danceability = supplied(music.danceability);
        let loud = music.loudness.is_some_and(|l| l > -6.0);

        if speechiness > 0.33 {
            "hiphop"
        } else if instrumentalness > 0.7 && f.energy < 0.3 {
            if acousticness > 0.6 {
                "classical"
            } else {
                "ambient"
            }
        } else if acousticness > 0.7 && f.energy < 0.5 {
            "folk"
        } else if f.energy > 0.85 && f.valence < 0.35 && loud {
            "metal"
        } else if danceability > 0.75 && f.energy > 0.6 {
            "electronic"
        } else {
            DEFAULT_GENRE
        }
    }
}

impl GenreClassifier for HeuristicGenreClassifier {
    fn detect_genre(&self, music: &MusicAnalysisData) -> Result<String> {
        if let Some(profile) = music.genre_label().and_then(profile_for) {
            return Ok(profile.genre.to_string());
        }
        Ok(Self::guess_from_features(music).to_string())
    }

    fn preset_for_track(&self, music: &MusicAnalysisData) -> Result<EnhancementPreset> {
        let genre = self.detect_genre(music)?;
        Ok(profile_for(&genre).map_or(EnhancementPreset::STANDARD, |p| p.preset.clone()))
    }

    fn color_characteristics(&self, genre: &str) -> Result<GenreCharacteristics> {
        Ok(profile_for(genre).map(|p| p.characteristics).unwrap_or_default())
    }
}
