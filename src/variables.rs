//! Flat name → value variable mapping handed to the presentation layer.
//!
//! Names are CSS custom-property style (`--music-color-vibrant-hex`). The map is
//! ordered so that emitted output is stable across runs.

use std::collections::BTreeMap;

use crate::color::{OklabColor, OklchColor, RgbColor};

/// Ordered variable mapping.
pub type VariableMap = BTreeMap<String, String>;

/// Format a float for emission with fixed precision.
#[must_use]
pub fn fmt_float(value: f64, precision: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let text = format!("{value:.precision$}");
    // Anything that rounds to zero prints without a sign
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => unsigned.to_string(),
        _ => text,
    }
}

/// Turn a palette key such as `DARK_VIBRANT` into `dark-vibrant`.
#[must_use]
pub fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Small builder that prefixes every name it inserts.
pub(crate) struct VariableWriter<'a> {
    map: &'a mut VariableMap,
    prefix: String,
}

impl<'a> VariableWriter<'a> {
    pub(crate) fn new(map: &'a mut VariableMap, prefix: impl Into<String>) -> Self {
        Self { map, prefix: prefix.into() }
    }

    pub(crate) fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.map.insert(format!("{}-{name}", self.prefix), value.into());
        self
    }

    pub(crate) fn float(&mut self, name: &str, value: f64, precision: usize) -> &mut Self {
        self.set(name, fmt_float(value, precision))
    }

    pub(crate) fn rgb(&mut self, name: &str, rgb: RgbColor) -> &mut Self {
        self.set(&format!("{name}-hex"), rgb.to_hex())
            .set(&format!("{name}-rgb"), rgb.to_css_triple())
    }

    pub(crate) fn oklab(&mut self, name: &str, lab: OklabColor) -> &mut Self {
        self.float(&format!("{name}-oklab-l"), lab.l, 4)
            .float(&format!("{name}-oklab-a"), lab.a, 4)
            .float(&format!("{name}-oklab-b"), lab.b, 4)
    }

    pub(crate) fn oklch(&mut self, name: &str, lch: OklchColor) -> &mut Self {
        self.float(&format!("{name}-oklch-l"), lch.l, 4)
            .float(&format!("{name}-oklch-c"), lch.c, 4)
            .float(&format!("{name}-oklch-h"), lch.h, 2)
    }
}
