//! Request and response types of the coordinator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::RgbColor;
use crate::emotion::{EmotionalState, EmotionalTemperatureResult};
use crate::enhance::OklabProcessingResult;
use crate::genre::{GenreCharacteristics, DEFAULT_GENRE};
use crate::music::MusicAnalysisData;
use crate::preset::EnhancementPreset;
use crate::variables::{slug, VariableMap, VariableWriter};

/// Muted mauve used when no accent can be picked from the palette.
pub const DEFAULT_ACCENT_RGB: RgbColor = RgbColor::new(0xcb, 0xa6, 0xf7);

const VARIABLE_PREFIX: &str = "--music";

/// One request: music features plus the palette to enhance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicalColorContext {
    /// Audio analysis of the track.
    #[serde(default)]
    pub music: MusicAnalysisData,
    /// Palette name → hex color.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    /// Track identifier.
    #[serde(default)]
    pub track_id: String,
    /// Request timestamp, part of the cache key.
    #[serde(default)]
    pub timestamp: u64,
    /// Presentation mode, passed through to [`ColorResult`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl MusicalColorContext {
    /// Context for a track with the given palette.
    #[must_use]
    pub fn new(track_id: impl Into<String>, music: MusicAnalysisData) -> Self {
        Self {
            track_id: track_id.into(),
            music,
            ..Self::default()
        }
    }

    /// Add a palette entry.
    #[must_use]
    pub fn with_color(mut self, name: impl Into<String>, hex: impl Into<String>) -> Self {
        self.colors.insert(name.into(), hex.into());
        self
    }

    /// Set the request timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the presentation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// How the preset for a request was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStrategy {
    /// Preset from the genre classifier.
    GenrePrimary,
    /// Preset from the emotion classifier.
    EmotionPrimary,
    /// Even blend of the genre and emotion presets.
    Balanced,
    /// STANDARD preset; music data was unusable.
    Fallback,
}

impl ProcessingStrategy {
    /// Kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenrePrimary => "genre-primary",
            Self::EmotionPrimary => "emotion-primary",
            Self::Balanced => "balanced",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    /// Skip automatic strategy selection. Ignored when the music data has no
    /// usable energy/valence.
    #[serde(default)]
    pub force_strategy: Option<ProcessingStrategy>,
    /// Chroma multiplier for the balanced blend; the configured value when absent.
    #[serde(default)]
    pub intensity_multiplier: Option<f64>,
    /// Recompute even if a cached result exists. The fresh result is still stored.
    #[serde(default)]
    pub bypass_cache: bool,
}

impl ProcessingOptions {
    /// Force a strategy.
    #[must_use]
    pub fn force(strategy: ProcessingStrategy) -> Self {
        Self {
            force_strategy: Some(strategy),
            ..Self::default()
        }
    }
}

/// Everything the presentation layer needs for one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicalOklabResult {
    /// Processed palette, same keys as the input minus unparseable entries.
    pub enhanced_colors: BTreeMap<String, OklabProcessingResult>,
    /// Accent color as `#rrggbb`.
    pub accent_hex: String,
    /// Accent color.
    pub accent_rgb: RgbColor,
    /// Preset the palette was enhanced with.
    pub preset: EnhancementPreset,
    /// Genre reported by the genre classifier.
    pub detected_genre: String,
    /// Emotion classification, with the emotion engine's own preset.
    pub emotion: EmotionalTemperatureResult,
    /// Genre descriptor.
    pub genre_characteristics: GenreCharacteristics,
    /// Time spent computing this result.
    pub processing_time: Duration,
    /// How strongly the music shaped the palette, 0-1.
    pub music_influence_strength: f64,
    /// How the preset was chosen.
    pub strategy: ProcessingStrategy,
    /// Flat variables, including the emotion variables.
    pub variables: VariableMap,
}

impl MusicalOklabResult {
    /// Degraded result: no processed colors, STANDARD preset, default
    /// accent, `default` genre and a neutral `calm` emotion.
    #[must_use]
    pub fn fallback() -> Self {
        Self::fallback_with_accent(DEFAULT_ACCENT_RGB)
    }

    /// [`fallback`](Self::fallback) with a specific accent color.
    #[must_use]
    pub fn fallback_with_accent(accent_rgb: RgbColor) -> Self {
        let emotion = EmotionalTemperatureResult::neutral();
        let preset = EnhancementPreset::STANDARD;
        let characteristics = GenreCharacteristics::default();
        let enhanced_colors = BTreeMap::new();
        let variables = emit_variables(&VariableInputs {
            colors: &enhanced_colors,
            accent_rgb,
            genre: DEFAULT_GENRE,
            characteristics,
            preset: &preset,
            strategy: ProcessingStrategy::Fallback,
            influence: 0.0,
            emotion: &emotion,
        });

        Self {
            enhanced_colors,
            accent_hex: accent_rgb.to_hex(),
            accent_rgb,
            preset,
            detected_genre: DEFAULT_GENRE.to_string(),
            emotion,
            genre_characteristics: characteristics,
            processing_time: Duration::ZERO,
            music_influence_strength: 0.0,
            strategy: ProcessingStrategy::Fallback,
            variables,
        }
    }

    /// Generic color-result view of this result.
    #[must_use]
    pub fn to_color_result(&self, context: &MusicalColorContext) -> ColorResult {
        ColorResult {
            processed_colors: self
                .enhanced_colors
                .iter()
                .map(|(name, r)| (name.clone(), r.enhanced_hex.clone()))
                .collect(),
            accent_hex: self.accent_hex.clone(),
            accent_rgb: self.accent_rgb,
            metadata: ColorMetadata {
                strategy: self.strategy,
                preset: self.preset.name().to_string(),
                genre: self.detected_genre.clone(),
                emotion: self.emotion.primary,
                secondary_emotion: self.emotion.secondary,
                music_influence_strength: self.music_influence_strength,
                processing_time_ms: self.processing_time.as_secs_f64() * 1000.0,
            },
            context: ColorContext {
                track_id: context.track_id.clone(),
                timestamp: context.timestamp,
                mode: context.mode.clone(),
            },
        }
    }
}

/// Interchange record shared with other color-result consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorResult {
    /// Palette name → enhanced hex.
    pub processed_colors: BTreeMap<String, String>,
    /// Accent color as `#rrggbb`.
    pub accent_hex: String,
    /// Accent color.
    pub accent_rgb: RgbColor,
    /// How the colors were produced.
    pub metadata: ColorMetadata,
    /// Request the colors belong to.
    pub context: ColorContext,
}

/// Provenance part of a [`ColorResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorMetadata {
    /// Strategy used.
    pub strategy: ProcessingStrategy,
    /// Preset name.
    pub preset: String,
    /// Detected genre.
    pub genre: String,
    /// Primary emotion.
    pub emotion: EmotionalState,
    /// Secondary emotion, if blended.
    pub secondary_emotion: Option<EmotionalState>,
    /// Influence score, 0-1.
    pub music_influence_strength: f64,
    /// Processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Request part of a [`ColorResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorContext {
    /// Track identifier.
    pub track_id: String,
    /// Request timestamp.
    pub timestamp: u64,
    /// Presentation mode.
    pub mode: Option<String>,
}

pub(super) struct VariableInputs<'a> {
    pub colors: &'a BTreeMap<String, OklabProcessingResult>,
    pub accent_rgb: RgbColor,
    pub genre: &'a str,
    pub characteristics: GenreCharacteristics,
    pub preset: &'a EnhancementPreset,
    pub strategy: ProcessingStrategy,
    pub influence: f64,
    pub emotion: &'a EmotionalTemperatureResult,
}

/// `color-<slug>` for a palette key, suffixed when another key already took it.
fn unique_color_slug(name: &str, used: &mut BTreeSet<String>) -> String {
    let base = format!("color-{}", slug(name));
    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    if candidate != base {
        tracing::warn!(key = %name, name = %candidate, "palette key collides after slugging");
    }
    candidate
}

pub(super) fn emit_variables(inputs: &VariableInputs<'_>) -> VariableMap {
    let mut vars = VariableMap::new();
    let mut w = VariableWriter::new(&mut vars, VARIABLE_PREFIX);

    let mut used = BTreeSet::new();
    for (name, r) in inputs.colors {
        let s = unique_color_slug(name, &mut used);
        w.set(&format!("{s}-hex"), r.enhanced_hex.as_str())
            .oklab(&s, r.enhanced_oklab)
            .float(&format!("{s}-oklch-c"), r.enhanced_oklch.c, 4)
            .float(&format!("{s}-oklch-h"), r.enhanced_oklch.h, 2)
            .set(&format!("{s}-shadow-hex"), r.shadow_hex.as_str());
    }

    let preset = inputs.preset;
    w.rgb("accent", inputs.accent_rgb)
        .set("genre", inputs.genre)
        .set("vibrancy", inputs.characteristics.vibrancy_level.as_str())
        .set("emotional-range", inputs.characteristics.emotional_range.as_str())
        .set("color-temperature", inputs.characteristics.color_temperature.as_str())
        .set("preset", preset.name())
        .float("preset-lightness-boost", preset.lightness_boost(), 3)
        .float("preset-chroma-boost", preset.chroma_boost(), 3)
        .float("preset-shadow-reduction", preset.shadow_reduction(), 3)
        .float("preset-vibrant-threshold", preset.vibrant_threshold(), 3)
        .set("strategy", inputs.strategy.as_str())
        .float("influence", inputs.influence, 3);

    vars.extend(inputs.emotion.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}
