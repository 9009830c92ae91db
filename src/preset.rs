//! Enhancement presets.
//!
//! A preset controls how far an OKLAB color is pushed toward higher lightness
//! and chroma and how its shadow variant is derived. Every preset, built-in or
//! constructed at runtime, has its four numeric fields clamped to fixed ranges.

use std::borrow::Cow;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Allowed range for [`EnhancementPreset::lightness_boost`].
pub const LIGHTNESS_BOOST_RANGE: RangeInclusive<f64> = 0.5..=1.5;
/// Allowed range for [`EnhancementPreset::chroma_boost`].
pub const CHROMA_BOOST_RANGE: RangeInclusive<f64> = 0.5..=2.0;
/// Allowed range for [`EnhancementPreset::shadow_reduction`].
pub const SHADOW_REDUCTION_RANGE: RangeInclusive<f64> = 0.1..=0.5;
/// Allowed range for [`EnhancementPreset::vibrant_threshold`].
pub const VIBRANT_THRESHOLD_RANGE: RangeInclusive<f64> = 0.05..=0.2;

/// Named, immutable enhancement configuration.
///
/// Fields are private so the clamping invariant cannot be bypassed; use
/// [`EnhancementPreset::custom`] to build one at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPreset")]
pub struct EnhancementPreset {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    lightness_boost: f64,
    chroma_boost: f64,
    shadow_reduction: f64,
    vibrant_threshold: f64,
}

impl EnhancementPreset {
    /// Gentle enhancement for already balanced palettes.
    pub const SUBTLE: Self = Self::builtin("SUBTLE", "Gentle lift for balanced palettes", 1.05, 1.10, 0.40, 0.08);
    /// Default enhancement.
    pub const STANDARD: Self = Self::builtin("STANDARD", "Balanced perceptual enhancement", 1.10, 1.15, 0.30, 0.10);
    /// Strong chroma push for energetic material.
    pub const VIBRANT: Self = Self::builtin("VIBRANT", "Saturated colors for energetic music", 1.15, 1.25, 0.25, 0.12);
    /// Deep shadows with a high vibrancy threshold.
    pub const COSMIC: Self = Self::builtin("COSMIC", "Deep shadows and selective saturation", 1.10, 1.20, 0.20, 0.15);

    const fn builtin(
        name: &'static str,
        description: &'static str,
        lightness_boost: f64,
        chroma_boost: f64,
        shadow_reduction: f64,
        vibrant_threshold: f64,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            lightness_boost,
            chroma_boost,
            shadow_reduction,
            vibrant_threshold,
        }
    }

    /// The four built-in presets.
    #[must_use]
    pub fn builtins() -> [Self; 4] {
        [Self::SUBTLE, Self::STANDARD, Self::VIBRANT, Self::COSMIC]
    }

    /// Look up a built-in preset by name, ignoring case.
    pub fn by_name(name: &str) -> Result<Self> {
        Self::builtins()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    /// Build a runtime preset, clamping each value into its range.
    ///
    /// NaN inputs take the low end of their range.
    #[must_use]
    pub fn custom(
        name: impl Into<String>,
        description: impl Into<String>,
        lightness_boost: f64,
        chroma_boost: f64,
        shadow_reduction: f64,
        vibrant_threshold: f64,
    ) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            description: Cow::Owned(description.into()),
            lightness_boost: clamp_to(lightness_boost, &LIGHTNESS_BOOST_RANGE),
            chroma_boost: clamp_to(chroma_boost, &CHROMA_BOOST_RANGE),
            shadow_reduction: clamp_to(shadow_reduction, &SHADOW_REDUCTION_RANGE),
            vibrant_threshold: clamp_to(vibrant_threshold, &VIBRANT_THRESHOLD_RANGE),
        }
    }

    /// Field-by-field weighted blend: `weight` of `self`, `1 - weight` of `other`.
    ///
    /// The chroma of the blend is multiplied by `chroma_multiplier` before clamping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPreset`] if the weight or multiplier is not finite.
    pub fn blend(&self, other: &Self, weight: f64, chroma_multiplier: f64) -> Result<Self> {
        if !weight.is_finite() || !chroma_multiplier.is_finite() {
            return Err(Error::InvalidPreset(format!(
                "cannot blend {} and {} with weight {weight} and multiplier {chroma_multiplier}",
                self.name, other.name
            )));
        }
        let w = weight.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a * w + b * (1.0 - w);

        Ok(Self::custom(
            format!("{}+{}", self.name, other.name),
            format!("Blend of {} and {}", self.name, other.name),
            mix(self.lightness_boost, other.lightness_boost),
            mix(self.chroma_boost, other.chroma_boost) * chroma_multiplier,
            mix(self.shadow_reduction, other.shadow_reduction),
            mix(self.vibrant_threshold, other.vibrant_threshold),
        ))
    }

    /// Preset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Multiplier applied to OKLAB L.
    #[must_use]
    pub fn lightness_boost(&self) -> f64 {
        self.lightness_boost
    }

    /// Multiplier applied to the a/b axes of sufficiently chromatic colors.
    #[must_use]
    pub fn chroma_boost(&self) -> f64 {
        self.chroma_boost
    }

    /// Multiplier applied to L for the shadow variant.
    #[must_use]
    pub fn shadow_reduction(&self) -> f64 {
        self.shadow_reduction
    }

    /// Chroma below which the chroma boost is skipped.
    #[must_use]
    pub fn vibrant_threshold(&self) -> f64 {
        self.vibrant_threshold
    }
}

impl Default for EnhancementPreset {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

/// Wire form used when a preset is read from configuration or JSON.
#[derive(Deserialize)]
struct RawPreset {
    name: String,
    #[serde(default)]
    description: String,
    lightness_boost: f64,
    chroma_boost: f64,
    shadow_reduction: f64,
    vibrant_threshold: f64,
}

impl TryFrom<RawPreset> for EnhancementPreset {
    type Error = Error;

    fn try_from(raw: RawPreset) -> Result<Self> {
        Ok(Self::custom(
            raw.name,
            raw.description,
            raw.lightness_boost,
            raw.chroma_boost,
            raw.shadow_reduction,
            raw.vibrant_threshold,
        ))
    }
}
