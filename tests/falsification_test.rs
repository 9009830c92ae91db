//! Falsification tests for the color pipeline.
//!
//! Each test is a falsifiable claim about observable behavior.
//!
//! Run: cargo test --test falsification_test

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use musical_oklab::cache::ManualClock;
use musical_oklab::color::{oklab_to_rgb, rgb_to_oklab, RgbColor};
use musical_oklab::config::PipelineConfig;
use musical_oklab::coordinator::{
    MusicalColorContext, ProcessingCoordinator, ProcessingOptions, ProcessingStrategy,
};
use musical_oklab::emotion::{EmotionalState, EmotionalStateClassifier};
use musical_oklab::enhance::{ColorProcessor, OklabProcessingResult, PerceptualColorEnhancer};
use musical_oklab::music::MusicAnalysisData;
use musical_oklab::preset::EnhancementPreset;

#[derive(Default)]
struct CountingProcessor {
    inner: PerceptualColorEnhancer,
    calls: AtomicUsize,
}

impl ColorProcessor for CountingProcessor {
    fn try_process_color(
        &self,
        hex: &str,
        preset: &EnhancementPreset,
    ) -> musical_oklab::Result<OklabProcessingResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.try_process_color(hex, preset)
    }
}

fn music(energy: f64, valence: f64, danceability: f64) -> MusicAnalysisData {
    MusicAnalysisData {
        danceability: Some(danceability),
        ..MusicAnalysisData::with_energy_valence(energy, valence)
    }
}

fn two_color_context(music: MusicAnalysisData) -> MusicalColorContext {
    MusicalColorContext::new("track-42", music)
        .with_color("VIBRANT", "#89b4fa")
        .with_color("PROMINENT", "#cba6f7")
}

// ============================================================================
// CONVERSION AND ENHANCEMENT CLAIMS (1-5)
// ============================================================================

/// Claim 1: RGB → OKLAB → RGB reproduces every channel within ±1
#[test]
fn claim_01_oklab_round_trip_within_one() {
    // xorshift32, fixed seed
    let mut state: u32 = 0x9e37_79b9;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };

    for _ in 0..1000 {
        let [r, g, b, _] = next().to_le_bytes();
        let rgb = RgbColor::new(r, g, b);
        let back = oklab_to_rgb(rgb_to_oklab(rgb));

        for (orig, round) in rgb.to_array().into_iter().zip(back.to_array()) {
            assert!(
                (i16::from(orig) - i16::from(round)).abs() <= 1,
                "Claim 1 FALSIFIED: {rgb:?} came back as {back:?}"
            );
        }
    }
}

/// Claim 2: Enhanced L stays in [0, 1] and shadow L never drops below 0.02
#[test]
fn claim_02_lightness_clamping() {
    let enhancer = PerceptualColorEnhancer::new();
    let extreme = EnhancementPreset::custom("EXTREME", "", 10.0, 10.0, 0.0, 0.0);
    let mut presets = EnhancementPreset::builtins().to_vec();
    presets.push(extreme);

    for hex in ["#000000", "#ffffff", "#ff0000", "#00ff00", "#0000ff", "#010101", "#fefefe", "#89b4fa"] {
        for preset in &presets {
            let result = enhancer.process_color(hex, preset);
            assert!(
                (0.0..=1.0).contains(&result.enhanced_oklab.l),
                "Claim 2 FALSIFIED: enhanced L {} for {hex} / {}",
                result.enhanced_oklab.l,
                preset.name()
            );
            assert!(
                result.shadow_oklab.l >= 0.02,
                "Claim 2 FALSIFIED: shadow L {} for {hex} / {}",
                result.shadow_oklab.l,
                preset.name()
            );
        }
    }
}

/// Claim 3: Processing the same color twice yields identical output
#[test]
fn claim_03_process_color_deterministic() {
    let enhancer = PerceptualColorEnhancer::new();
    let a = enhancer.process_color("#89b4fa", &EnhancementPreset::STANDARD);
    let b = enhancer.process_color("#89b4fa", &EnhancementPreset::STANDARD);

    assert_eq!(a.enhanced_hex, b.enhanced_hex);
    assert_eq!(a.shadow_hex, b.shadow_hex);
    assert_eq!(a.enhanced_oklab, b.enhanced_oklab);
    assert_eq!(a.shadow_oklab, b.shadow_oklab);
    assert_eq!(a.enhanced_oklch, b.enhanced_oklch);
}

/// Claim 4: A malformed hex never raises and yields the fallback color
#[test]
fn claim_04_malformed_hex_recovers() {
    let enhancer = PerceptualColorEnhancer::new();
    for hex in ["", "89b4fa", "#89b4f", "#zzzzzz", "#1234567"] {
        let result = enhancer.process_color(hex, &EnhancementPreset::STANDARD);
        assert!(result.fallback, "Claim 4 FALSIFIED: {hex:?} was not treated as invalid");
        assert_eq!(result.original_rgb, RgbColor::new(0x7c, 0x6f, 0x9b));
        assert_eq!(result.processing_time, Duration::ZERO);
    }
}

/// Claim 5: Palette processing skips unparseable entries silently
#[test]
fn claim_05_palette_skips_invalid() {
    let coordinator = ProcessingCoordinator::new();
    let ctx = two_color_context(music(0.5, 0.5, 0.5))
        .with_color("MUTED", "grey")
        .with_color("DARK_MUTED", "#12");

    let result = coordinator.process(&ctx, &ProcessingOptions::default());
    let keys: BTreeSet<&str> = result.enhanced_colors.keys().map(String::as_str).collect();

    assert_eq!(keys, BTreeSet::from(["PROMINENT", "VIBRANT"]));
}

// ============================================================================
// EMOTION CLAIMS (6-7)
// ============================================================================

/// Claim 6: High energy, high valence, danceable → energetic blended with epic
#[test]
fn claim_06_high_quadrant() {
    let result = EmotionalStateClassifier::new().classify(&music(0.9, 0.9, 0.9));

    assert_eq!(result.primary, EmotionalState::Energetic);
    assert_eq!(result.secondary, Some(EmotionalState::Epic));
    assert!((result.blend_ratio - 0.7).abs() < f64::EPSILON);
}

/// Claim 7: Very low energy and valence → melancholy or mysterious with ambient
#[test]
fn claim_07_low_quadrant() {
    let result = EmotionalStateClassifier::new().classify(&MusicAnalysisData::with_energy_valence(0.05, 0.05));

    assert!(matches!(result.primary, EmotionalState::Melancholy | EmotionalState::Mysterious));
    assert_eq!(result.secondary, Some(EmotionalState::Ambient));
    assert!((result.blend_ratio - 0.8).abs() < f64::EPSILON);
}

// ============================================================================
// COORDINATOR CLAIMS (8-13)
// ============================================================================

/// Claim 8: Missing energy/valence selects the fallback strategy and STANDARD
#[test]
fn claim_08_missing_features_fallback() {
    let coordinator = ProcessingCoordinator::new();
    let result = coordinator.process(
        &two_color_context(MusicAnalysisData::default()),
        &ProcessingOptions::default(),
    );

    assert_eq!(result.strategy, ProcessingStrategy::Fallback);
    assert_eq!(result.preset, EnhancementPreset::STANDARD);
}

/// Claim 9: Non-numeric energy in JSON input also selects the fallback strategy
#[test]
fn claim_09_non_numeric_features_fallback() {
    let json = r##"{
        "trackId": "json-track",
        "music": {"energy": "loud", "valence": 0.7, "danceability": 0.9},
        "colors": {"VIBRANT": "#89b4fa"}
    }"##;
    let ctx: MusicalColorContext = serde_json::from_str(json).unwrap();

    let result = ProcessingCoordinator::new().process(&ctx, &ProcessingOptions::default());

    assert_eq!(result.strategy, ProcessingStrategy::Fallback);
    assert_eq!(result.preset, EnhancementPreset::STANDARD);
    assert_eq!(result.enhanced_colors.len(), 1);
}

/// Claim 10: VIBRANT wins the accent over PROMINENT
#[test]
fn claim_10_accent_priority() {
    let result = ProcessingCoordinator::new()
        .process(&two_color_context(music(0.5, 0.5, 0.5)), &ProcessingOptions::default());

    assert_eq!(result.accent_hex, result.enhanced_colors["VIBRANT"].enhanced_hex);
}

/// Claim 11: Identical requests within the TTL do not reach the enhancer again;
/// after expiry they do
#[test]
fn claim_11_cache_within_ttl() {
    let processor = Arc::new(CountingProcessor::default());
    let clock = Arc::new(ManualClock::new());
    let coordinator = ProcessingCoordinator::new()
        .with_processor(processor.clone())
        .with_clock(clock.clone());
    let ctx = two_color_context(music(0.8, 0.85, 0.9));

    let first = coordinator.process(&ctx, &ProcessingOptions::default());
    let calls_after_first = processor.calls.load(Ordering::SeqCst);
    let second = coordinator.process(&ctx, &ProcessingOptions::default());

    assert_eq!(first, second);
    assert_eq!(processor.calls.load(Ordering::SeqCst), calls_after_first);

    clock.advance(Duration::from_secs(5 * 60));
    let _third = coordinator.process(&ctx, &ProcessingOptions::default());
    assert!(
        processor.calls.load(Ordering::SeqCst) > calls_after_first,
        "Claim 11 FALSIFIED: expired entry was served from the cache"
    );
}

/// Claim 12: End-to-end two-color example
#[test]
fn claim_12_end_to_end_example() {
    let result = ProcessingCoordinator::new()
        .process(&two_color_context(music(0.8, 0.85, 0.9)), &ProcessingOptions::default());

    assert_eq!(result.emotion.primary, EmotionalState::Energetic);
    assert_eq!(result.emotion.secondary, Some(EmotionalState::Epic));
    assert!((result.emotion.blend_ratio - 0.7).abs() < f64::EPSILON);

    let keys: Vec<&str> = result.enhanced_colors.keys().map(String::as_str).collect();
    assert_eq!(keys, ["PROMINENT", "VIBRANT"]);
    assert_eq!(result.accent_hex, result.enhanced_colors["VIBRANT"].enhanced_hex);

    assert!((0.0..=1.0).contains(&result.music_influence_strength));
    assert_eq!(result.variables["--emotion-secondary"], "epic");
}

/// Claim 13: A configuration file drives cache size and accent choice
#[test]
fn claim_13_config_file_applies() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "cache:\n  capacity: 1\naccent:\n  priority: [PROMINENT]\n"
    )
    .unwrap();
    let config = PipelineConfig::load(file.path()).unwrap();
    let coordinator = ProcessingCoordinator::with_config(config).unwrap();

    let a = coordinator.process(&two_color_context(music(0.5, 0.5, 0.5)), &ProcessingOptions::default());
    let _ = coordinator.process(
        &two_color_context(music(0.5, 0.5, 0.5)).with_timestamp(1),
        &ProcessingOptions::default(),
    );

    assert_eq!(a.accent_hex, a.enhanced_colors["PROMINENT"].enhanced_hex);
    assert_eq!(coordinator.cache_len(), 1);
}

/// Claim 14: The generic color result mirrors the enhanced palette
#[test]
fn claim_14_color_result_conversion() {
    let ctx = two_color_context(music(0.8, 0.85, 0.9)).with_mode("ambient-light");
    let result = ProcessingCoordinator::new().process(&ctx, &ProcessingOptions::default());
    let color_result = result.to_color_result(&ctx);

    assert_eq!(color_result.processed_colors["VIBRANT"], result.enhanced_colors["VIBRANT"].enhanced_hex);
    assert_eq!(color_result.accent_hex, result.accent_hex);
    assert_eq!(color_result.metadata.emotion, EmotionalState::Energetic);
    assert_eq!(color_result.context.mode.as_deref(), Some("ambient-light"));

    let json = serde_json::to_value(&color_result).unwrap();
    assert!(json.get("processedColors").is_some());
    assert!(json["metadata"].get("musicInfluenceStrength").is_some());
}
