//! Quadrant classifier with genre overrides and contextual presets.

use super::states::genre_override;
use super::{warmth_label, EmotionalState, EmotionalTemperatureResult};
use crate::enhance::{ColorProcessor, OklabProcessingResult, PerceptualColorEnhancer};
use crate::genre::normalize_genre;
use crate::music::{MusicAnalysisData, MusicFeatures};
use crate::preset::EnhancementPreset;
use crate::variables::{fmt_float, VariableMap, VariableWriter};

const INTENSITY_MIN: f64 = 0.1;
const INTENSITY_MAX: f64 = 1.5;
const VARIABLE_PREFIX: &str = "--emotion";

/// Primary/secondary pair chosen from features and genre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSelection {
    /// Dominant state.
    pub primary: EmotionalState,
    /// Blended-in state.
    pub secondary: Option<EmotionalState>,
    /// Weight of the primary; 1.0 without a secondary.
    pub blend_ratio: f64,
}

impl StateSelection {
    fn single(primary: EmotionalState) -> Self {
        Self { primary, secondary: None, blend_ratio: 1.0 }
    }

    fn blended(primary: EmotionalState, secondary: EmotionalState, blend_ratio: f64) -> Self {
        Self { primary, secondary: Some(secondary), blend_ratio }
    }

    /// Apply a genre override, if the genre has one.
    fn with_genre(mut self, genre: Option<&str>) -> Self {
        let Some(rule) = genre.map(normalize_genre).as_deref().and_then(genre_override) else {
            return self;
        };

        if let Some(primary) = rule.primary {
            self.primary = primary;
            if self.secondary == Some(primary) {
                self.secondary = None;
                self.blend_ratio = 1.0;
            }
        }
        if let Some((secondary, ratio)) = rule.secondary {
            if secondary != self.primary {
                self.secondary = Some(secondary);
                self.blend_ratio = ratio;
            }
        }
        self
    }
}

/// Maps audio features to an [`EmotionalTemperatureResult`].
///
/// Deterministic: identical input always produces identical output apart from
/// the embedded processing duration.
#[derive(Debug, Clone, Default)]
pub struct EmotionalStateClassifier {
    enhancer: PerceptualColorEnhancer,
}

impl EmotionalStateClassifier {
    /// Classifier with the default enhancer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier using a specific enhancer for the representative color.
    #[must_use]
    pub fn with_enhancer(enhancer: PerceptualColorEnhancer) -> Self {
        Self { enhancer }
    }

    /// Classify one bundle of features.
    #[must_use]
    pub fn classify(&self, music: &MusicAnalysisData) -> EmotionalTemperatureResult {
        let features = music.resolve();
        let selection = Self::select_states(&features, music.genre_label());
        let intensity = Self::intensity(selection.primary, &features);
        let temperature = Self::temperature(selection.primary, &features);
        let preset = Self::contextual_preset(selection.primary, &features, intensity);

        let base_hex = selection.primary.characteristics().base_hex;
        let oklab_result = match self.enhancer.try_process_color(base_hex, &preset) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(state = %selection.primary, error = %e, "using unmodified base color");
                None
            }
        };
        let perceptual_hex = oklab_result
            .as_ref()
            .map_or_else(|| base_hex.to_string(), |r| r.enhanced_hex.clone());

        let variables = emit_variables(
            &selection,
            intensity,
            temperature,
            &preset,
            &perceptual_hex,
            oklab_result.as_ref(),
        );

        tracing::debug!(
            primary = %selection.primary,
            secondary = ?selection.secondary,
            intensity,
            temperature,
            "classified track"
        );

        EmotionalTemperatureResult {
            primary: selection.primary,
            secondary: selection.secondary,
            intensity,
            temperature,
            blend_ratio: selection.blend_ratio,
            preset,
            oklab_result,
            perceptual_hex: Some(perceptual_hex),
            variables,
        }
    }

    /// Quadrant selection followed by the genre override.
    #[must_use]
    pub fn select_states(features: &MusicFeatures, genre: Option<&str>) -> StateSelection {
        use EmotionalState::{
            Aggressive, Ambient, Calm, Energetic, Epic, Happy, Melancholy, Mysterious, Romantic,
        };

        let (e, v, d) = (features.energy, features.valence, features.danceability);

        let selection = if e >= 0.6 && v >= 0.6 {
            let primary = if d > 0.7 { Energetic } else { Happy };
            if e >= 0.8 && v >= 0.8 {
                StateSelection::blended(primary, Epic, 0.7)
            } else {
                StateSelection::single(primary)
            }
        } else if e >= 0.6 && v < 0.5 {
            let primary = if e > 0.8 { Aggressive } else { Epic };
            if v < 0.3 {
                StateSelection::blended(primary, Mysterious, 0.8)
            } else {
                StateSelection::single(primary)
            }
        } else if e < 0.4 && v >= 0.5 {
            let primary = if v > 0.7 { Calm } else { Romantic };
            if e < 0.2 {
                StateSelection::blended(primary, Ambient, 0.6)
            } else {
                StateSelection::single(primary)
            }
        } else {
            let primary = if v < 0.3 { Melancholy } else { Mysterious };
            if e < 0.2 && v < 0.2 {
                StateSelection::blended(primary, Ambient, 0.8)
            } else {
                StateSelection::single(primary)
            }
        };

        selection.with_genre(genre)
    }

    /// Base intensity plus energy, valence extremity and tempo contributions.
    #[must_use]
    pub fn intensity(state: EmotionalState, features: &MusicFeatures) -> f64 {
        let tempo = if features.tempo > 140.0 {
            0.1
        } else if features.tempo < 80.0 {
            -0.1
        } else {
            0.0
        };
        let raw = state.characteristics().intensity
            + 0.3 * features.energy
            + 0.2 * (features.valence - 0.5).abs()
            + tempo;
        raw.clamp(INTENSITY_MIN, INTENSITY_MAX)
    }

    /// Legacy Kelvin temperature within the state's range.
    #[must_use]
    pub fn temperature(state: EmotionalState, features: &MusicFeatures) -> f64 {
        let range = &state.characteristics().temperature;
        let position = (0.6 * features.energy + 0.4 * features.valence).clamp(0.0, 1.0);
        range.start() + (range.end() - range.start()) * position
    }

    /// One-off preset derived from the state's base preset and the features.
    #[must_use]
    pub fn contextual_preset(
        state: EmotionalState,
        features: &MusicFeatures,
        intensity: f64,
    ) -> EnhancementPreset {
        let ch = state.characteristics();
        let base = &ch.preset;
        let (lo, hi) = (*ch.lightness.start(), *ch.lightness.end());

        let position = 0.2 + 0.5 * features.energy + 0.3 * features.valence;
        let target_lightness = lo + (hi - lo) * position;
        let band_mid = (lo + hi) / 2.0;

        let lightness_boost = base.lightness_boost() * target_lightness / band_mid;
        let chroma_boost = base.chroma_boost() * intensity * (0.8 + 0.4 * features.energy);

        EnhancementPreset::custom(
            format!("{}-{}", state.as_str(), base.name().to_ascii_lowercase()),
            format!("{} tuned for {state} at intensity {intensity:.2}", base.name()),
            lightness_boost,
            chroma_boost,
            base.shadow_reduction(),
            base.vibrant_threshold(),
        )
    }

    /// Breathing-cycle duration in seconds.
    ///
    /// Scales inversely with intensity, bounded to 0.5x-2.0x of the state's base.
    #[must_use]
    pub fn breathing_duration(state: EmotionalState, intensity: f64) -> f64 {
        let base = state.characteristics().breathing_secs;
        (base / intensity.max(INTENSITY_MIN)).clamp(base * 0.5, base * 2.0)
    }
}

/// Temperature-derived presentation filters: (hue shift deg, saturation, brightness).
fn temperature_filters(state: EmotionalState, temperature: f64, intensity: f64) -> (f64, f64, f64) {
    let warm_offset = 5500.0 - temperature;
    let hue_shift = state.characteristics().hue_shift + (warm_offset / 250.0).clamp(-10.0, 10.0);
    let saturation = (1.0 + warm_offset / 20_000.0 + (intensity - 0.5) * 0.2).clamp(0.7, 1.4);
    let brightness = (1.0 - warm_offset / 30_000.0).clamp(0.9, 1.1);
    (hue_shift, saturation, brightness)
}

fn emit_variables(
    selection: &StateSelection,
    intensity: f64,
    temperature: f64,
    preset: &EnhancementPreset,
    perceptual_hex: &str,
    oklab: Option<&OklabProcessingResult>,
) -> VariableMap {
    let state = selection.primary;
    let (hue_shift, saturation, brightness) = temperature_filters(state, temperature, intensity);
    let breathing = EmotionalStateClassifier::breathing_duration(state, intensity);

    let mut vars = VariableMap::new();
    let mut w = VariableWriter::new(&mut vars, VARIABLE_PREFIX);
    w.set("primary", state.as_str())
        .set("secondary", selection.secondary.map_or("none", EmotionalState::as_str))
        .float("blend-ratio", selection.blend_ratio, 2)
        .float("intensity", intensity, 3)
        .float("temperature", temperature, 0)
        .set("warmth", warmth_label(temperature))
        .set("breathing-duration", format!("{}s", fmt_float(breathing, 2)))
        .set("hue-shift", format!("{}deg", fmt_float(hue_shift, 1)))
        .float("saturation", saturation, 3)
        .float("brightness", brightness, 3)
        .float("chroma-target", state.characteristics().chroma_boost, 2)
        .set("preset", preset.name())
        .set("perceptual-hex", perceptual_hex);

    if let Some(result) = oklab {
        w.rgb("perceptual", result.enhanced_rgb)
            .oklab("perceptual", result.enhanced_oklab)
            .oklch("perceptual", result.enhanced_oklch)
            .rgb("shadow", result.shadow_rgb)
            .oklab("shadow", result.shadow_oklab);
    }
    vars
}

pub(super) fn neutral_result() -> EmotionalTemperatureResult {
    let state = EmotionalState::Calm;
    let ch = state.characteristics();
    let selection = StateSelection::single(state);
    let intensity = ch.intensity;
    let temperature = (ch.temperature.start() + ch.temperature.end()) / 2.0;
    let preset = ch.preset.clone();
    let variables = emit_variables(&selection, intensity, temperature, &preset, ch.base_hex, None);

    EmotionalTemperatureResult {
        primary: state,
        secondary: None,
        intensity,
        temperature,
        blend_ratio: 1.0,
        preset,
        oklab_result: None,
        perceptual_hex: Some(ch.base_hex.to_string()),
        variables,
    }
}
