//! Static per-state configuration and the genre override table.

use std::ops::RangeInclusive;

use super::EmotionalState;
use crate::preset::EnhancementPreset;

/// Fixed configuration of one [`EmotionalState`].
#[derive(Debug, Clone)]
pub struct EmotionCharacteristics {
    /// Energy range typical of the state.
    pub energy: RangeInclusive<f64>,
    /// Valence range typical of the state.
    pub valence: RangeInclusive<f64>,
    /// Legacy color temperature range in Kelvin.
    pub temperature: RangeInclusive<f64>,
    /// Representative base color.
    pub base_hex: &'static str,
    /// Preset the contextual preset starts from.
    pub preset: EnhancementPreset,
    /// Target OKLAB lightness band.
    pub lightness: RangeInclusive<f64>,
    /// Target chroma multiplier relative to the base color.
    pub chroma_boost: f64,
    /// Hue rotation in degrees applied by presentation filters.
    pub hue_shift: f64,
    /// Base intensity before feature contributions.
    pub intensity: f64,
    /// Breathing-cycle duration in seconds at intensity 1.0.
    pub breathing_secs: f64,
}

pub(super) static CALM: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.0..=0.4,
    valence: 0.5..=1.0,
    temperature: 5500.0..=6500.0,
    base_hex: "#7fb3d5",
    preset: EnhancementPreset::SUBTLE,
    lightness: 0.65..=0.80,
    chroma_boost: 0.9,
    hue_shift: -10.0,
    intensity: 0.3,
    breathing_secs: 4.0,
};

pub(super) static MELANCHOLY: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.0..=0.4,
    valence: 0.0..=0.3,
    temperature: 6500.0..=8000.0,
    base_hex: "#5d6d7e",
    preset: EnhancementPreset::SUBTLE,
    lightness: 0.35..=0.55,
    chroma_boost: 0.8,
    hue_shift: -20.0,
    intensity: 0.4,
    breathing_secs: 5.0,
};

pub(super) static ENERGETIC: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.7..=1.0,
    valence: 0.6..=1.0,
    temperature: 3500.0..=4500.0,
    base_hex: "#ff6b35",
    preset: EnhancementPreset::VIBRANT,
    lightness: 0.60..=0.80,
    chroma_boost: 1.3,
    hue_shift: 15.0,
    intensity: 0.8,
    breathing_secs: 1.5,
};

pub(super) static AGGRESSIVE: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.8..=1.0,
    valence: 0.0..=0.4,
    temperature: 2000.0..=3000.0,
    base_hex: "#c0392b",
    preset: EnhancementPreset::COSMIC,
    lightness: 0.40..=0.60,
    chroma_boost: 1.4,
    hue_shift: 5.0,
    intensity: 0.9,
    breathing_secs: 1.0,
};

pub(super) static HAPPY: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.6..=0.8,
    valence: 0.6..=1.0,
    temperature: 3000.0..=4000.0,
    base_hex: "#f7dc6f",
    preset: EnhancementPreset::VIBRANT,
    lightness: 0.70..=0.90,
    chroma_boost: 1.2,
    hue_shift: 10.0,
    intensity: 0.6,
    breathing_secs: 2.0,
};

pub(super) static ROMANTIC: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.2..=0.5,
    valence: 0.5..=0.7,
    temperature: 2700.0..=3500.0,
    base_hex: "#e8a0bf",
    preset: EnhancementPreset::STANDARD,
    lightness: 0.60..=0.75,
    chroma_boost: 1.05,
    hue_shift: 5.0,
    intensity: 0.5,
    breathing_secs: 3.5,
};

pub(super) static MYSTERIOUS: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.3..=0.6,
    valence: 0.2..=0.5,
    temperature: 7000.0..=9000.0,
    base_hex: "#6c5ce7",
    preset: EnhancementPreset::COSMIC,
    lightness: 0.30..=0.50,
    chroma_boost: 1.1,
    hue_shift: -15.0,
    intensity: 0.55,
    breathing_secs: 3.0,
};

pub(super) static EPIC: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.6..=1.0,
    valence: 0.3..=0.7,
    temperature: 4000.0..=5500.0,
    base_hex: "#d4af37",
    preset: EnhancementPreset::COSMIC,
    lightness: 0.50..=0.70,
    chroma_boost: 1.25,
    hue_shift: 0.0,
    intensity: 0.75,
    breathing_secs: 2.5,
};

pub(super) static AMBIENT: EmotionCharacteristics = EmotionCharacteristics {
    energy: 0.0..=0.3,
    valence: 0.3..=0.7,
    temperature: 6000.0..=7500.0,
    base_hex: "#a3c4bc",
    preset: EnhancementPreset::SUBTLE,
    lightness: 0.55..=0.75,
    chroma_boost: 0.85,
    hue_shift: -5.0,
    intensity: 0.25,
    breathing_secs: 6.0,
};

/// Genre-driven adjustment of a quadrant classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreOverride {
    /// Normalized genre key (see [`crate::genre::normalize_genre`]).
    pub genre: &'static str,
    /// Replacement primary state.
    pub primary: Option<EmotionalState>,
    /// Injected secondary state and the primary's blend weight.
    pub secondary: Option<(EmotionalState, f64)>,
}

const fn replace(genre: &'static str, primary: EmotionalState) -> GenreOverride {
    GenreOverride { genre, primary: Some(primary), secondary: None }
}

const fn replace_and_blend(
    genre: &'static str,
    primary: EmotionalState,
    secondary: EmotionalState,
    ratio: f64,
) -> GenreOverride {
    GenreOverride { genre, primary: Some(primary), secondary: Some((secondary, ratio)) }
}

const fn blend(genre: &'static str, secondary: EmotionalState, ratio: f64) -> GenreOverride {
    GenreOverride { genre, primary: None, secondary: Some((secondary, ratio)) }
}

/// Sorted by genre key.
pub static GENRE_OVERRIDES: &[GenreOverride] = &[
    replace("ambient", EmotionalState::Ambient),
    replace("blues", EmotionalState::Melancholy),
    replace_and_blend("classical", EmotionalState::Epic, EmotionalState::Calm, 0.6),
    replace("dance", EmotionalState::Energetic),
    replace("drumandbass", EmotionalState::Energetic),
    replace("edm", EmotionalState::Energetic),
    replace("electronic", EmotionalState::Energetic),
    replace("folk", EmotionalState::Calm),
    replace("hardcore", EmotionalState::Aggressive),
    replace_and_blend("hiphop", EmotionalState::Energetic, EmotionalState::Aggressive, 0.75),
    blend("indie", EmotionalState::Melancholy, 0.8),
    replace_and_blend("jazz", EmotionalState::Mysterious, EmotionalState::Romantic, 0.7),
    replace_and_blend("lofi", EmotionalState::Calm, EmotionalState::Ambient, 0.7),
    replace("metal", EmotionalState::Aggressive),
    replace("pop", EmotionalState::Happy),
    replace("punk", EmotionalState::Aggressive),
    replace("rnb", EmotionalState::Romantic),
    blend("rock", EmotionalState::Energetic, 0.75),
    replace("soul", EmotionalState::Romantic),
    replace("soundtrack", EmotionalState::Epic),
    replace_and_blend("techno", EmotionalState::Energetic, EmotionalState::Mysterious, 0.8),
];

/// Look up the override for an already normalized genre key.
#[must_use]
pub fn genre_override(normalized: &str) -> Option<&'static GenreOverride> {
    GENRE_OVERRIDES
        .binary_search_by(|o| o.genre.cmp(normalized))
        .ok()
        .map(|i| &GENRE_OVERRIDES[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_sorted_for_binary_search() {
        for pair in GENRE_OVERRIDES.windows(2) {
            assert!(pair[0].genre < pair[1].genre, "{} !< {}", pair[0].genre, pair[1].genre);
        }
    }

    #[test]
    fn test_override_lookup() {
        let metal = genre_override("metal").unwrap();
        assert_eq!(metal.primary, Some(EmotionalState::Aggressive));
        assert_eq!(metal.secondary, None);

        let jazz = genre_override("jazz").unwrap();
        assert_eq!(jazz.secondary, Some((EmotionalState::Romantic, 0.7)));

        assert!(genre_override("polka").is_none());
    }

    #[test]
    fn test_characteristics_ranges_are_sane() {
        for state in EmotionalState::ALL {
            let ch = state.characteristics();
            assert!(ch.lightness.start() < ch.lightness.end(), "{state}");
            assert!(ch.temperature.start() < ch.temperature.end(), "{state}");
            assert!(ch.breathing_secs > 0.0, "{state}");
            assert!(crate::color::hex_to_rgb(ch.base_hex).is_ok(), "{state}");
        }
    }
}
