//! Color types and color space conversions.
//!
//! Provides 8-bit sRGB, OKLAB and OKLCH representations with conversions
//! between them. All functions here are pure and stateless; the only failure
//! mode is a malformed hex string.
//!
//! # References
//!
//! - Ottosson, B. (2020). "A perceptual color space for image processing."
//!   <https://bottosson.github.io/posts/oklab/>
//! - IEC 61966-2-1:1999. sRGB transfer function.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RGB color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl RgbColor {
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from unit-range floats, clamping to [0, 1] and rounding.
    #[must_use]
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        Self::new(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b))
    }

    /// Convert to array representation.
    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Lowercase `#rrggbb` representation.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Comma separated `r,g,b` triple, the form downstream CSS consumers expect.
    #[must_use]
    pub fn to_css_triple(self) -> String {
        format!("{},{},{}", self.r, self.g, self.b)
    }

    /// Convert to OKLAB.
    #[must_use]
    pub fn to_oklab(self) -> OklabColor {
        rgb_to_oklab(self)
    }
}

impl std::str::FromStr for RgbColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        hex_to_rgb(s)
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from(arr: [u8; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// OKLAB color: perceptual lightness plus two opponent chroma axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OklabColor {
    /// Lightness (0.0 = black, 1.0 = white).
    pub l: f64,
    /// Green (-) to red (+) axis.
    pub a: f64,
    /// Blue (-) to yellow (+) axis.
    pub b: f64,
}

impl OklabColor {
    /// Create a new OKLAB color.
    #[must_use]
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma, the distance from the neutral axis.
    #[must_use]
    pub fn chroma(self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Linear interpolation of all three coordinates, `t` clamped to [0, 1].
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.l + (other.l - self.l) * t,
            self.a + (other.a - self.a) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Convert to 8-bit sRGB (out-of-gamut channels are clamped).
    #[must_use]
    pub fn to_rgb(self) -> RgbColor {
        oklab_to_rgb(self)
    }

    /// Convert to the cylindrical OKLCH form.
    #[must_use]
    pub fn to_oklch(self) -> OklchColor {
        oklab_to_oklch(self)
    }
}

/// OKLCH color: the polar restatement of [`OklabColor`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OklchColor {
    /// Lightness, identical to OKLAB L.
    pub l: f64,
    /// Chroma (>= 0).
    pub c: f64,
    /// Hue in degrees, [0, 360).
    pub h: f64,
}

impl From<OklabColor> for OklchColor {
    fn from(lab: OklabColor) -> Self {
        oklab_to_oklch(lab)
    }
}

impl From<OklchColor> for OklabColor {
    fn from(lch: OklchColor) -> Self {
        oklch_to_oklab(lch)
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Parse `#RGB` or `#RRGGBB` (case-insensitive) into an [`RgbColor`].
///
/// # Errors
///
/// Returns [`Error::InvalidHex`] for anything else, including a missing `#`.
pub fn hex_to_rgb(hex: &str) -> Result<RgbColor> {
    let invalid = || Error::InvalidHex(hex.to_string());

    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match digits.len() {
        3 => {
            let expand = |i: usize| -> Result<u8> {
                let v = channel(&digits[i..=i])?;
                Ok(v * 17)
            };
            Ok(RgbColor::new(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Ok(RgbColor::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(invalid()),
    }
}

/// Format 0-255 channel values as lowercase `#rrggbb`, clamping and rounding.
#[must_use]
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let channel = |v: f64| {
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, 255.0) as u8
        }
    };
    RgbColor::new(channel(r), channel(g), channel(b)).to_hex()
}

/// Convert sRGB component [0,1] to linear light.
#[must_use]
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert linear light to sRGB component [0,1].
#[must_use]
pub fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert 8-bit sRGB to OKLAB.
#[must_use]
pub fn rgb_to_oklab(rgb: RgbColor) -> OklabColor {
    let r = srgb_to_linear(f64::from(rgb.r) / 255.0);
    let g = srgb_to_linear(f64::from(rgb.g) / 255.0);
    let b = srgb_to_linear(f64::from(rgb.b) / 255.0);

    // Linear RGB to LMS cone responses
    let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
    let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
    let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    OklabColor::new(
        0.210_454_255_3 * l_ + 0.793_617_785_0 * m_ - 0.004_072_046_8 * s_,
        1.977_998_495_1 * l_ - 2.428_592_205_0 * m_ + 0.450_593_709_9 * s_,
        0.025_904_037_1 * l_ + 0.782_771_766_2 * m_ - 0.808_675_766_0 * s_,
    )
}

/// Convert OKLAB to linear RGB without clamping.
#[must_use]
pub fn oklab_to_linear_rgb(lab: OklabColor) -> (f64, f64, f64) {
    let l_ = lab.l + 0.396_337_777_4 * lab.a + 0.215_803_757_3 * lab.b;
    let m_ = lab.l - 0.105_561_345_8 * lab.a - 0.063_854_172_8 * lab.b;
    let s_ = lab.l - 0.089_484_177_5 * lab.a - 1.291_485_548_0 * lab.b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    (
        4.076_741_662_1 * l - 3.307_711_591_3 * m + 0.230_969_929_2 * s,
        -1.268_438_004_6 * l + 2.609_757_401_1 * m - 0.341_319_396_5 * s,
        -0.004_196_086_3 * l - 0.703_418_614_7 * m + 1.707_614_701_0 * s,
    )
}

/// Convert OKLAB to 8-bit sRGB, clamping out-of-gamut channels.
#[must_use]
pub fn oklab_to_rgb(lab: OklabColor) -> RgbColor {
    let (r, g, b) = oklab_to_linear_rgb(lab);
    RgbColor::from_unit(
        linear_to_srgb(r.clamp(0.0, 1.0)),
        linear_to_srgb(g.clamp(0.0, 1.0)),
        linear_to_srgb(b.clamp(0.0, 1.0)),
    )
}

/// Convert OKLAB to OKLCH with hue normalized to [0, 360).
///
/// Achromatic input (a = b = 0) yields hue 0.
#[must_use]
pub fn oklab_to_oklch(lab: OklabColor) -> OklchColor {
    let c = lab.a.hypot(lab.b);
    let mut h = lab.b.atan2(lab.a).to_degrees();
    if h < 0.0 {
        h += 360.0;
    }
    if h >= 360.0 {
        h -= 360.0;
    }
    OklchColor { l: lab.l, c, h }
}

/// Convert OKLCH (hue in degrees) back to OKLAB.
#[must_use]
pub fn oklch_to_oklab(lch: OklchColor) -> OklabColor {
    let h = lch.h.to_radians();
    OklabColor::new(lch.l, lch.c * h.cos(), lch.c * h.sin())
}

/// Convenience: parse hex straight to OKLAB.
pub fn hex_to_oklab(hex: &str) -> Result<OklabColor> {
    hex_to_rgb(hex).map(rgb_to_oklab)
}

fn unit_to_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hex_to_rgb_six_digits() {
        let rgb = hex_to_rgb("#89b4fa").unwrap();
        assert_eq!(rgb, RgbColor::new(0x89, 0xb4, 0xfa));
    }

    #[test]
    fn test_hex_to_rgb_three_digits() {
        let rgb = hex_to_rgb("#f0A").unwrap();
        assert_eq!(rgb, RgbColor::new(255, 0, 170));
    }

    #[test]
    fn test_hex_to_rgb_rejects_malformed() {
        for bad in ["89b4fa", "#89b4f", "#89b4fag", "#", "", "#12345678", "##fff", "#ggg"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(Error::InvalidHex(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_hex_rejects_non_ascii() {
        assert!(hex_to_rgb("#ééé").is_err());
    }

    #[test]
    fn test_rgb_to_hex_clamps_and_rounds() {
        assert_eq!(rgb_to_hex(255.4, -3.0, 127.5), "#ff0080");
        assert_eq!(rgb_to_hex(300.0, 0.49, f64::NAN), "#ff0000");
    }

    #[test]
    fn test_to_hex_lowercase() {
        assert_eq!(RgbColor::new(0xAB, 0xCD, 0xEF).to_hex(), "#abcdef");
    }

    #[test]
    fn test_from_str() {
        let rgb: RgbColor = "#000".parse().unwrap();
        assert_eq!(rgb, RgbColor::BLACK);
    }

    #[test]
    fn test_white_oklab() {
        let lab = rgb_to_oklab(RgbColor::WHITE);
        assert_abs_diff_eq!(lab.l, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lab.a, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lab.b, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_black_oklab() {
        let lab = rgb_to_oklab(RgbColor::BLACK);
        assert_abs_diff_eq!(lab.l, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lab.chroma(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_red_oklab_reference() {
        // Reference values from Ottosson's post
        let lab = rgb_to_oklab(RgbColor::new(255, 0, 0));
        assert_abs_diff_eq!(lab.l, 0.627_955, epsilon = 1e-3);
        assert_abs_diff_eq!(lab.a, 0.224_863, epsilon = 1e-3);
        assert_abs_diff_eq!(lab.b, 0.125_846, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip_primaries() {
        for rgb in [
            RgbColor::new(255, 0, 0),
            RgbColor::new(0, 255, 0),
            RgbColor::new(0, 0, 255),
            RgbColor::new(0x89, 0xb4, 0xfa),
            RgbColor::new(0xcb, 0xa6, 0xf7),
        ] {
            assert_eq!(oklab_to_rgb(rgb_to_oklab(rgb)), rgb);
        }
    }

    #[test]
    fn test_oklch_hue_normalized() {
        // Negative b gives a negative atan2, which must wrap
        let lch = oklab_to_oklch(OklabColor::new(0.5, 0.1, -0.1));
        assert!((0.0..360.0).contains(&lch.h));
        assert_abs_diff_eq!(lch.h, 315.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lch.c, 0.1_f64.hypot(0.1), epsilon = 1e-12);
    }

    #[test]
    fn test_oklch_achromatic_no_nan() {
        let lch = oklab_to_oklch(OklabColor::new(0.5, 0.0, 0.0));
        assert_abs_diff_eq!(lch.h, 0.0);
        assert_abs_diff_eq!(lch.c, 0.0);
    }

    #[test]
    fn test_oklch_round_trip() {
        let lab = OklabColor::new(0.7, -0.05, 0.12);
        let back = oklch_to_oklab(oklab_to_oklch(lab));
        assert_abs_diff_eq!(back.a, lab.a, epsilon = 1e-12);
        assert_abs_diff_eq!(back.b, lab.b, epsilon = 1e-12);
    }

    #[test]
    fn test_oklab_lerp_boundaries() {
        let a = OklabColor::new(0.2, 0.1, -0.1);
        let b = OklabColor::new(0.8, -0.1, 0.1);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 2.0), b);
        let mid = a.lerp(b, 0.5);
        assert_abs_diff_eq!(mid.l, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.a, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_gamut_is_clamped() {
        let rgb = oklab_to_rgb(OklabColor::new(1.2, 0.4, 0.4));
        assert_eq!(rgb.r, 255);
    }
}

// ============================================================================
// Property-based tests with proptest
// ============================================================================
