//! End-to-end pipeline: music features + palette → enhanced palette and variables.
//!
//! A request goes through these stages:
//!
//! 1. **Cache lookup** keyed by track id, timestamp and music data
//! 2. **Strategy selection** (fallback, forced, emotion-primary, genre-primary, balanced)
//! 3. **Preset resolution** for the chosen strategy
//! 4. **Palette enhancement** through a [`ColorProcessor`]
//! 5. **Emotion and genre classification** for reporting
//! 6. **Influence score, accent and variables**
//!
//! [`ProcessingCoordinator::process`] never fails. Errors at a component
//! boundary degrade the result (STANDARD preset, default genre) and anything
//! the pipeline cannot recover from yields [`MusicalOklabResult::fallback`].

mod result;
mod stats;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheKey, Clock, ResultCache};
use crate::color::RgbColor;
use crate::config::PipelineConfig;
use crate::emotion::{EmotionalStateClassifier, EmotionalTemperatureResult};
use crate::enhance::{ColorProcessor, OklabProcessingResult, PerceptualColorEnhancer, DEFAULT_FALLBACK_RGB};
use crate::error::Result;
use crate::genre::{GenreCharacteristics, GenreClassifier, HeuristicGenreClassifier, DEFAULT_GENRE};
use crate::music::MusicAnalysisData;
use crate::preset::EnhancementPreset;

use result::{emit_variables, VariableInputs};

pub use result::{
    ColorContext, ColorMetadata, ColorResult, MusicalColorContext, MusicalOklabResult,
    ProcessingOptions, ProcessingStrategy, DEFAULT_ACCENT_RGB,
};
pub use stats::CoordinatorStats;

use stats::StatsCounters;

/// Blend weight of the genre preset in the balanced strategy.
const BALANCED_WEIGHT: f64 = 0.5;

/// Owns the pipeline components, the result cache and the configuration.
pub struct ProcessingCoordinator {
    processor: Arc<dyn ColorProcessor>,
    genre: Arc<dyn GenreClassifier>,
    emotion: EmotionalStateClassifier,
    cache: ResultCache<MusicalOklabResult>,
    config: PipelineConfig,
    default_accent: RgbColor,
    stats: StatsCounters,
}

impl fmt::Debug for ProcessingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingCoordinator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl Default for ProcessingCoordinator {
    fn default() -> Self {
        Self::build(PipelineConfig::default(), DEFAULT_FALLBACK_RGB, DEFAULT_ACCENT_RGB)
    }
}

impl ProcessingCoordinator {
    /// Coordinator with the default configuration, enhancer and genre classifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinator with a specific configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`](crate::Error::ConfigInvalid) if the
    /// configuration does not validate.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let fallback_rgb = config.fallback_rgb()?;
        let default_accent = config.default_accent_rgb()?;
        Ok(Self::build(config, fallback_rgb, default_accent))
    }

    fn build(config: PipelineConfig, fallback_rgb: RgbColor, default_accent: RgbColor) -> Self {
        let enhancer = PerceptualColorEnhancer::with_fallback(fallback_rgb);
        Self {
            processor: Arc::new(enhancer.clone()),
            genre: Arc::new(HeuristicGenreClassifier::new()),
            emotion: EmotionalStateClassifier::with_enhancer(enhancer),
            cache: ResultCache::new(config.cache.capacity, config.cache_ttl()),
            config,
            default_accent,
            stats: StatsCounters::default(),
        }
    }

    /// Replace the palette processor.
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn ColorProcessor>) -> Self {
        self.processor = processor;
        self
    }

    /// Replace the genre classifier.
    #[must_use]
    pub fn with_genre_classifier(mut self, genre: Arc<dyn GenreClassifier>) -> Self {
        self.genre = genre;
        self
    }

    /// Drive cache expiry from a specific clock. Drops any cached results.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = ResultCache::with_clock(self.config.cache.capacity, self.config.cache_ttl(), clock);
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a request, degrading to [`MusicalOklabResult::fallback`] on error.
    #[must_use]
    pub fn process(&self, context: &MusicalColorContext, options: &ProcessingOptions) -> MusicalOklabResult {
        match self.try_process(context, options) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(track = %context.track_id, error = %e, "returning fallback result");
                self.stats.record_computed(std::time::Duration::ZERO, true);
                MusicalOklabResult::fallback_with_accent(self.default_accent)
            }
        }
    }

    /// Process a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the
    /// cache key cannot be computed.
    pub fn try_process(
        &self,
        context: &MusicalColorContext,
        options: &ProcessingOptions,
    ) -> Result<MusicalOklabResult> {
        self.stats.record_request();
        let key = CacheKey::for_request(&context.track_id, context.timestamp, &context.music)?;

        if !options.bypass_cache {
            if let Some(cached) = self.cache.get(key) {
                tracing::debug!(track = %context.track_id, "cache hit");
                self.stats.record_hit();
                return Ok(cached);
            }
            tracing::debug!(track = %context.track_id, "cache miss");
        }

        let result = self.compute(context, options);
        self.stats
            .record_computed(result.processing_time, result.strategy == ProcessingStrategy::Fallback);
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    fn compute(&self, context: &MusicalColorContext, options: &ProcessingOptions) -> MusicalOklabResult {
        let start = Instant::now();
        let music = &context.music;

        let genre = self.detect_genre(music);
        let characteristics = self.genre_characteristics(&genre);
        let emotion = self.emotion.classify(music);
        let strategy = self.select_strategy(music, options, &genre);
        let preset = self.resolve_preset(strategy, music, &emotion, options);

        let enhanced_colors = self.processor.process_palette(&context.colors, &preset);
        let influence = influence_score(music, emotion.intensity, &genre);
        let (accent_hex, accent_rgb) = self.select_accent(&enhanced_colors);

        let variables = emit_variables(&VariableInputs {
            colors: &enhanced_colors,
            accent_rgb,
            genre: &genre,
            characteristics,
            preset: &preset,
            strategy,
            influence,
            emotion: &emotion,
        });

        let processing_time = start.elapsed();
        if processing_time > self.config.slow_request_threshold() {
            tracing::warn!(
                track = %context.track_id,
                elapsed_ms = processing_time.as_secs_f64() * 1000.0,
                colors = context.colors.len(),
                "slow color request"
            );
        }
        tracing::debug!(
            track = %context.track_id,
            %strategy,
            preset = preset.name(),
            genre = %genre,
            emotion = %emotion.primary,
            "processed request"
        );

        MusicalOklabResult {
            enhanced_colors,
            accent_hex,
            accent_rgb,
            preset,
            detected_genre: genre,
            emotion,
            genre_characteristics: characteristics,
            processing_time,
            music_influence_strength: influence,
            strategy,
            variables,
        }
    }

    /// Choose how the preset for a request is resolved.
    ///
    /// Missing energy or valence always selects [`ProcessingStrategy::Fallback`],
    /// even over a forced strategy.
    #[must_use]
    pub fn select_strategy(
        &self,
        music: &MusicAnalysisData,
        options: &ProcessingOptions,
        genre: &str,
    ) -> ProcessingStrategy {
        if !music.has_core_features() {
            return ProcessingStrategy::Fallback;
        }
        if let Some(forced) = options.force_strategy {
            return forced;
        }

        let features = music.resolve();
        let extremity = (features.energy - 0.5).abs() + (features.valence - 0.5).abs();
        if extremity > self.config.strategy.extremity_threshold {
            ProcessingStrategy::EmotionPrimary
        } else if is_known_genre(genre) {
            ProcessingStrategy::GenrePrimary
        } else {
            ProcessingStrategy::Balanced
        }
    }

    fn resolve_preset(
        &self,
        strategy: ProcessingStrategy,
        music: &MusicAnalysisData,
        emotion: &EmotionalTemperatureResult,
        options: &ProcessingOptions,
    ) -> EnhancementPreset {
        match strategy {
            ProcessingStrategy::Fallback => EnhancementPreset::STANDARD,
            ProcessingStrategy::EmotionPrimary => emotion.preset.clone(),
            ProcessingStrategy::GenrePrimary => self.genre_preset(music),
            ProcessingStrategy::Balanced => {
                let multiplier = options
                    .intensity_multiplier
                    .unwrap_or(self.config.strategy.intensity_multiplier);
                self.genre_preset(music)
                    .blend(&emotion.preset, BALANCED_WEIGHT, multiplier)
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "balanced blend failed, using STANDARD");
                        EnhancementPreset::STANDARD
                    })
            }
        }
    }

    fn genre_preset(&self, music: &MusicAnalysisData) -> EnhancementPreset {
        self.genre.preset_for_track(music).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "genre preset lookup failed, using STANDARD");
            EnhancementPreset::STANDARD
        })
    }

    fn detect_genre(&self, music: &MusicAnalysisData) -> String {
        match self.genre.detect_genre(music) {
            Ok(genre) if !genre.trim().is_empty() => genre,
            Ok(_) => DEFAULT_GENRE.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "genre detection failed");
                DEFAULT_GENRE.to_string()
            }
        }
    }

    fn genre_characteristics(&self, genre: &str) -> GenreCharacteristics {
        self.genre.color_characteristics(genre).unwrap_or_else(|e| {
            tracing::warn!(genre, error = %e, "genre characteristics lookup failed");
            GenreCharacteristics::default()
        })
    }

    /// First configured priority key present, else the first processed color,
    /// else the configured default accent.
    fn select_accent(&self, colors: &BTreeMap<String, OklabProcessingResult>) -> (String, RgbColor) {
        self.config
            .accent
            .priority
            .iter()
            .find_map(|key| colors.get(key))
            .or_else(|| colors.values().next())
            .map_or_else(
                || (self.default_accent.to_hex(), self.default_accent),
                |r| (r.enhanced_hex.clone(), r.enhanced_rgb),
            )
    }

    /// Counters since construction or the last [`reset_stats`](Self::reset_stats).
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        self.stats.snapshot()
    }

    /// Zero all counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Drop expired cached results, returning how many were removed.
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep()
    }

    /// Number of cached results.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

fn is_known_genre(genre: &str) -> bool {
    !genre.is_empty() && genre != DEFAULT_GENRE
}

/// How strongly the music shaped the palette, in [0, 1].
///
/// `(E + 2|V-0.5| + intensity) / 3`, scaled by a context boost that gains 0.1
/// each for a known tempo, danceability above 0.7 and a known genre.
#[must_use]
pub fn influence_score(music: &MusicAnalysisData, emotional_intensity: f64, genre: &str) -> f64 {
    let features = music.resolve();

    let mut context_boost = 1.0;
    if music.known_tempo().is_some() {
        context_boost += 0.1;
    }
    if features.danceability > 0.7 {
        context_boost += 0.1;
    }
    if is_known_genre(genre) {
        context_boost += 0.1;
    }

    let base = (features.energy + (features.valence - 0.5).abs() * 2.0 + emotional_intensity) / 3.0;
    (base * context_boost).clamp(0.0, 1.0)
}
