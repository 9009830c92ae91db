//! # Musical-OKLAB
//!
//! Perceptual palette enhancement driven by music analysis features.
//!
//! An album-art palette (name → hex) and a bundle of audio features go in; an
//! enhanced palette, an accent color and a flat map of presentation variables
//! come out. All color math happens in the OKLAB space, so lightness and
//! chroma adjustments look uniform across hues.
//!
//! ## Features
//!
//! - **OKLAB/OKLCH conversions**: exact sRGB round-trip within one 8-bit step
//! - **Perceptual enhancement**: lightness lift, selective chroma boost, shadow variants
//! - **Emotion engine**: nine emotional states, genre overrides, color temperature
//! - **Coordinator**: strategy selection, accent picking, LRU + TTL result cache
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use musical_oklab::prelude::*;
//!
//! let music = MusicAnalysisData {
//!     danceability: Some(0.9),
//!     ..MusicAnalysisData::with_energy_valence(0.8, 0.85)
//! };
//! let context = MusicalColorContext::new("track-id", music)
//!     .with_color("VIBRANT", "#89b4fa")
//!     .with_color("PROMINENT", "#cba6f7");
//!
//! let coordinator = ProcessingCoordinator::new();
//! let result = coordinator.process(&context, &ProcessingOptions::default());
//! println!("accent: {}", result.accent_hex);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Process palette entries in parallel with rayon

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in color code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Color Modules
// ============================================================================

/// Color types and color space conversions.
pub mod color;

/// Enhancement presets.
pub mod preset;

/// Perceptual color enhancement.
pub mod enhance;

// ============================================================================
// Music Modules
// ============================================================================

/// Audio analysis input.
pub mod music;

/// Emotional state classification.
pub mod emotion;

/// Genre classifier seam and built-in heuristic classifier.
pub mod genre;

// ============================================================================
// Pipeline Modules
// ============================================================================

/// Bounded, time-limited result cache.
pub mod cache;

/// Pipeline configuration.
pub mod config;

/// Request orchestration.
pub mod coordinator;

/// Presentation variables.
pub mod variables;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for musical-oklab operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust,ignore
/// use musical_oklab::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{Clock, ManualClock, ResultCache, SystemClock};
    pub use crate::color::{hex_to_rgb, rgb_to_hex, rgb_to_oklab, oklab_to_rgb, oklab_to_oklch};
    pub use crate::color::{OklabColor, OklchColor, RgbColor};
    pub use crate::config::PipelineConfig;
    pub use crate::coordinator::{
        ColorResult, MusicalColorContext, MusicalOklabResult, ProcessingCoordinator,
        ProcessingOptions, ProcessingStrategy,
    };
    pub use crate::emotion::{EmotionalState, EmotionalStateClassifier, EmotionalTemperatureResult};
    pub use crate::enhance::{ColorProcessor, OklabProcessingResult, PerceptualColorEnhancer};
    pub use crate::error::{Error, Result};
    pub use crate::genre::{GenreCharacteristics, GenreClassifier, HeuristicGenreClassifier};
    pub use crate::music::MusicAnalysisData;
    pub use crate::preset::EnhancementPreset;
    pub use crate::variables::VariableMap;
}
