//! Perceptual color enhancement in OKLAB space.
//!
//! The enhancer lifts lightness, boosts chroma of colors that are already
//! colorful enough, and derives a darker, slightly desaturated shadow variant
//! with the same hue.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::color::{hex_to_rgb, OklabColor, OklchColor, RgbColor};
use crate::error::{Error, Result};
use crate::preset::EnhancementPreset;

/// Muted violet used when a color cannot be parsed.
pub const DEFAULT_FALLBACK_RGB: RgbColor = RgbColor::new(0x7c, 0x6f, 0x9b);

/// Lowest lightness a shadow may have.
pub const MIN_SHADOW_LIGHTNESS: f64 = 0.02;

/// Chroma scale applied to shadows.
pub const SHADOW_CHROMA_FACTOR: f64 = 0.8;

/// Full record for one processed color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OklabProcessingResult {
    /// Input hex, as given.
    pub original_hex: String,
    /// Parsed input color.
    pub original_rgb: RgbColor,
    /// Enhanced color as `#rrggbb`.
    pub enhanced_hex: String,
    /// Enhanced color.
    pub enhanced_rgb: RgbColor,
    /// Shadow variant as `#rrggbb`.
    pub shadow_hex: String,
    /// Shadow variant.
    pub shadow_rgb: RgbColor,
    /// OKLAB of the input.
    pub original_oklab: OklabColor,
    /// OKLAB after enhancement, before gamut clamping.
    pub enhanced_oklab: OklabColor,
    /// OKLAB of the shadow, before gamut clamping.
    pub shadow_oklab: OklabColor,
    /// Cylindrical form of `enhanced_oklab`.
    pub enhanced_oklch: OklchColor,
    /// Wall-clock time spent; zero for fallback results.
    pub processing_time: Duration,
    /// True when the input could not be parsed and the fallback color was used.
    pub fallback: bool,
}

/// Seam for anything that can enhance a single color.
///
/// The coordinator depends on this trait rather than on
/// [`PerceptualColorEnhancer`] so that alternative processors (and counting
/// test doubles) can be plugged in.
pub trait ColorProcessor: Send + Sync {
    /// Enhance one hex color.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHex`] if `hex` is malformed.
    fn try_process_color(&self, hex: &str, preset: &EnhancementPreset)
        -> Result<OklabProcessingResult>;

    /// Enhance every entry of a name → hex mapping.
    ///
    /// Entries that fail to parse are skipped; their key is absent from the output.
    fn process_palette(
        &self,
        colors: &BTreeMap<String, String>,
        preset: &EnhancementPreset,
    ) -> BTreeMap<String, OklabProcessingResult> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            colors
                .par_iter()
                .filter_map(|(name, hex)| palette_entry(self, name, hex, preset))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            colors
                .iter()
                .filter_map(|(name, hex)| palette_entry(self, name, hex, preset))
                .collect()
        }
    }
}

fn palette_entry<P: ColorProcessor + ?Sized>(
    processor: &P,
    name: &str,
    hex: &str,
    preset: &EnhancementPreset,
) -> Option<(String, OklabProcessingResult)> {
    match processor.try_process_color(hex, preset) {
        Ok(result) => Some((name.to_string(), result)),
        Err(e) => {
            tracing::debug!(color = name, error = %e, "skipping palette entry");
            None
        }
    }
}

/// OKLAB enhancer with a configurable fallback color.
#[derive(Debug, Clone)]
pub struct PerceptualColorEnhancer {
    fallback_rgb: RgbColor,
}

impl Default for PerceptualColorEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptualColorEnhancer {
    /// Create an enhancer that falls back to [`DEFAULT_FALLBACK_RGB`].
    #[must_use]
    pub const fn new() -> Self {
        Self { fallback_rgb: DEFAULT_FALLBACK_RGB }
    }

    /// Create an enhancer with a caller-supplied fallback color.
    #[must_use]
    pub const fn with_fallback(fallback_rgb: RgbColor) -> Self {
        Self { fallback_rgb }
    }

    /// The color used for unparseable input.
    #[must_use]
    pub const fn fallback_rgb(&self) -> RgbColor {
        self.fallback_rgb
    }

    /// Enhance one hex color; malformed input yields the fallback result.
    #[must_use]
    pub fn process_color(&self, hex: &str, preset: &EnhancementPreset) -> OklabProcessingResult {
        self.try_process_color(hex, preset).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using fallback color");
            self.fallback_result(hex, preset)
        })
    }

    /// Result built from the fallback color with zero processing time.
    #[must_use]
    pub fn fallback_result(&self, hex: &str, preset: &EnhancementPreset) -> OklabProcessingResult {
        let rgb = self.fallback_rgb;
        let lab = rgb.to_oklab();
        let shadow_oklab = shadow_of(lab, preset);
        let shadow_rgb = shadow_oklab.to_rgb();

        OklabProcessingResult {
            original_hex: hex.to_string(),
            original_rgb: rgb,
            enhanced_hex: rgb.to_hex(),
            enhanced_rgb: rgb,
            shadow_hex: shadow_rgb.to_hex(),
            shadow_rgb,
            original_oklab: lab,
            enhanced_oklab: lab,
            shadow_oklab,
            enhanced_oklch: lab.to_oklch(),
            processing_time: Duration::ZERO,
            fallback: true,
        }
    }

    /// Interpolate two colors in OKLAB at fraction `t` and enhance the mix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHex`] if either endpoint is malformed.
    pub fn interpolate_oklab(
        &self,
        hex_a: &str,
        hex_b: &str,
        t: f64,
        preset: &EnhancementPreset,
    ) -> Result<OklabProcessingResult> {
        let start = Instant::now();
        let a = hex_to_rgb(hex_a)?.to_oklab();
        let b = hex_to_rgb(hex_b)?.to_oklab();
        let mixed = a.lerp(b, t);
        let rgb = mixed.to_rgb();

        Ok(enhance(rgb.to_hex(), rgb, mixed, preset, start))
    }

    /// `steps` evenly spaced interpolations from `hex_a` to `hex_b`, endpoints included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGradientSteps`] when `steps < 2`, or
    /// [`Error::InvalidHex`] if either endpoint is malformed.
    pub fn generate_oklab_gradient(
        &self,
        hex_a: &str,
        hex_b: &str,
        steps: usize,
        preset: &EnhancementPreset,
    ) -> Result<Vec<OklabProcessingResult>> {
        if steps < 2 {
            return Err(Error::InvalidGradientSteps(steps));
        }
        let last = (steps - 1) as f64;
        (0..steps)
            .map(|i| self.interpolate_oklab(hex_a, hex_b, i as f64 / last, preset))
            .collect()
    }
}

impl ColorProcessor for PerceptualColorEnhancer {
    fn try_process_color(
        &self,
        hex: &str,
        preset: &EnhancementPreset,
    ) -> Result<OklabProcessingResult> {
        let start = Instant::now();
        let rgb = hex_to_rgb(hex)?;
        Ok(enhance(hex.to_string(), rgb, rgb.to_oklab(), preset, start))
    }
}

/// Apply a preset's lightness and chroma boosts.
#[must_use]
pub fn enhance_oklab(lab: OklabColor, preset: &EnhancementPreset) -> OklabColor {
    let l = (lab.l * preset.lightness_boost()).clamp(0.0, 1.0);
    if lab.chroma() > preset.vibrant_threshold() {
        OklabColor::new(l, lab.a * preset.chroma_boost(), lab.b * preset.chroma_boost())
    } else {
        OklabColor::new(l, lab.a, lab.b)
    }
}

/// Darker, slightly desaturated variant with the same hue.
#[must_use]
pub fn shadow_of(lab: OklabColor, preset: &EnhancementPreset) -> OklabColor {
    OklabColor::new(
        (lab.l * preset.shadow_reduction()).max(MIN_SHADOW_LIGHTNESS),
        lab.a * SHADOW_CHROMA_FACTOR,
        lab.b * SHADOW_CHROMA_FACTOR,
    )
}

fn enhance(
    original_hex: String,
    original_rgb: RgbColor,
    original_oklab: OklabColor,
    preset: &EnhancementPreset,
    start: Instant,
) -> OklabProcessingResult {
    let enhanced_oklab = enhance_oklab(original_oklab, preset);
    let shadow_oklab = shadow_of(original_oklab, preset);
    let enhanced_rgb = enhanced_oklab.to_rgb();
    let shadow_rgb = shadow_oklab.to_rgb();

    OklabProcessingResult {
        original_hex,
        original_rgb,
        enhanced_hex: enhanced_rgb.to_hex(),
        enhanced_rgb,
        shadow_hex: shadow_rgb.to_hex(),
        shadow_rgb,
        original_oklab,
        enhanced_oklab,
        shadow_oklab,
        enhanced_oklch: enhanced_oklab.to_oklch(),
        processing_time: start.elapsed(),
        fallback: false,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_preset() -> impl Strategy<Value = EnhancementPreset> {
        (0.0f64..3.0, 0.0f64..3.0, 0.0f64..1.0, 0.0f64..0.5).prop_map(|(l, c, s, v)| {
            EnhancementPreset::custom("prop", "", l, c, s, v)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Enhanced L stays in [0, 1] and shadow L never drops below the floor.
        #[test]
        fn prop_lightness_bounds(
            r in any::<u8>(), g in any::<u8>(), b in any::<u8>(),
            preset in any_preset()
        ) {
            let hex = RgbColor::new(r, g, b).to_hex();
            let result = PerceptualColorEnhancer::new().process_color(&hex, &preset);

            prop_assert!((0.0..=1.0).contains(&result.enhanced_oklab.l));
            prop_assert!(result.shadow_oklab.l >= MIN_SHADOW_LIGHTNESS);
            prop_assert!(!result.fallback);
        }

        /// The shadow keeps the hue of the input.
        #[test]
        fn prop_shadow_keeps_hue(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let hex = RgbColor::new(r, g, b).to_hex();
            let result = PerceptualColorEnhancer::new().process_color(&hex, &EnhancementPreset::STANDARD);
            let orig = result.original_oklab;
            prop_assume!(orig.chroma() > 1e-6);

            let shadow = result.shadow_oklab.to_oklch();
            prop_assert!((shadow.h - orig.to_oklch().h).abs() < 1e-6);
        }
    }
}
