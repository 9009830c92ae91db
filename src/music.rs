//! Audio analysis features.
//!
//! [`MusicAnalysisData`] mirrors what an external analysis service hands us:
//! every field is optional and non-numeric values are treated as absent.
//! [`MusicAnalysisData::resolve`] is the single place where defaults are filled in.

use serde::{Deserialize, Deserializer, Serialize};

/// Neutral value for unit-range features (energy, valence, ...).
pub const NEUTRAL_FEATURE: f64 = 0.5;
/// Neutral tempo in BPM.
pub const NEUTRAL_TEMPO: f64 = 120.0;
/// Neutral loudness in dB.
pub const NEUTRAL_LOUDNESS: f64 = -10.0;
/// Neutral mode (1 = major).
pub const NEUTRAL_MODE: i32 = 1;
/// Key when unknown (pitch class notation uses 0-11).
pub const UNKNOWN_KEY: i32 = -1;

/// Raw, possibly incomplete analysis of a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicAnalysisData {
    /// Perceived intensity, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    /// Musical positiveness, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    /// Suitability for dancing, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    /// Beats per minute.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    /// Overall loudness in dB.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
    /// Confidence the track is acoustic, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
    /// Likelihood of no vocals, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f64>,
    /// Presence of spoken words, 0-1.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub speechiness: Option<f64>,
    /// 1 = major, 0 = minor.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub mode: Option<i32>,
    /// Pitch class of the key, 0-11.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub key: Option<i32>,
    /// Free-form genre label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Fully populated features, produced by [`MusicAnalysisData::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicFeatures {
    /// Energy, 0-1.
    pub energy: f64,
    /// Valence, 0-1.
    pub valence: f64,
    /// Danceability, 0-1.
    pub danceability: f64,
    /// Tempo in BPM.
    pub tempo: f64,
    /// Loudness in dB.
    pub loudness: f64,
    /// Acousticness, 0-1.
    pub acousticness: f64,
    /// Instrumentalness, 0-1.
    pub instrumentalness: f64,
    /// Speechiness, 0-1.
    pub speechiness: f64,
    /// 1 = major, 0 = minor.
    pub mode: i32,
    /// Pitch class, or [`UNKNOWN_KEY`].
    pub key: i32,
}

impl Default for MusicFeatures {
    fn default() -> Self {
        MusicAnalysisData::default().resolve()
    }
}

impl MusicAnalysisData {
    /// Data with only energy and valence set.
    #[must_use]
    pub fn with_energy_valence(energy: f64, valence: f64) -> Self {
        Self {
            energy: Some(energy),
            valence: Some(valence),
            ..Self::default()
        }
    }

    /// Fill missing fields with neutral defaults.
    ///
    /// Unit-range features are clamped to [0, 1]; non-finite values count as missing.
    #[must_use]
    pub fn resolve(&self) -> MusicFeatures {
        let unit = |v: Option<f64>| finite(v).map_or(NEUTRAL_FEATURE, |v| v.clamp(0.0, 1.0));

        MusicFeatures {
            energy: unit(self.energy),
            valence: unit(self.valence),
            danceability: unit(self.danceability),
            tempo: finite(self.tempo).map_or(NEUTRAL_TEMPO, |t| t.max(0.0)),
            loudness: finite(self.loudness).unwrap_or(NEUTRAL_LOUDNESS),
            acousticness: unit(self.acousticness),
            instrumentalness: unit(self.instrumentalness),
            speechiness: unit(self.speechiness),
            mode: self.mode.unwrap_or(NEUTRAL_MODE),
            key: self.key.filter(|k| (0..12).contains(k)).unwrap_or(UNKNOWN_KEY),
        }
    }

    /// True when both energy and valence are present and finite.
    #[must_use]
    pub fn has_core_features(&self) -> bool {
        finite(self.energy).is_some() && finite(self.valence).is_some()
    }

    /// Tempo, only if it was supplied and is positive.
    #[must_use]
    pub fn known_tempo(&self) -> Option<f64> {
        finite(self.tempo).filter(|t| *t > 0.0)
    }

    /// Genre label, trimmed, if non-empty.
    #[must_use]
    pub fn genre_label(&self) -> Option<&str> {
        self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(serde::de::IgnoredAny),
}

/// Accept a value of the expected type; anything else (strings, objects) becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<Lenient<T>> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Value(v)) => Some(v),
        Some(Lenient::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_resolve_defaults() {
        let features = MusicAnalysisData::default().resolve();
        assert_abs_diff_eq!(features.energy, 0.5);
        assert_abs_diff_eq!(features.valence, 0.5);
        assert_abs_diff_eq!(features.danceability, 0.5);
        assert_abs_diff_eq!(features.tempo, 120.0);
        assert_eq!(features.mode, 1);
        assert_eq!(features.key, UNKNOWN_KEY);
    }

    #[test]
    fn test_resolve_clamps_and_ignores_nan() {
        let data = MusicAnalysisData {
            energy: Some(1.7),
            valence: Some(f64::NAN),
            key: Some(14),
            ..MusicAnalysisData::default()
        };
        let features = data.resolve();
        assert_abs_diff_eq!(features.energy, 1.0);
        assert_abs_diff_eq!(features.valence, 0.5);
        assert_eq!(features.key, UNKNOWN_KEY);
        assert!(!data.has_core_features());
    }

    #[test]
    fn test_deserialize_non_numeric_as_absent() {
        let json = r#"{"energy":"loud","valence":0.4,"tempo":null,"mode":1,"genre":"Jazz"}"#;
        let data: MusicAnalysisData = serde_json::from_str(json).unwrap();

        assert_eq!(data.energy, None);
        assert_eq!(data.valence, Some(0.4));
        assert_eq!(data.tempo, None);
        assert_eq!(data.mode, Some(1));
        assert_eq!(data.genre_label(), Some("Jazz"));
        assert!(!data.has_core_features());
    }

    #[test]
    fn test_deserialize_integers_as_floats() {
        let data: MusicAnalysisData = serde_json::from_str(r#"{"energy":1,"valence":0}"#).unwrap();
        assert_eq!(data.energy, Some(1.0));
        assert!(data.has_core_features());
    }

    #[test]
    fn test_serialize_skips_missing() {
        let data = MusicAnalysisData::with_energy_valence(0.8, 0.2);
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"energy":0.8,"valence":0.2}"#);
    }

    #[test]
    fn test_known_tempo() {
        let mut data = MusicAnalysisData::default();
        assert_eq!(data.known_tempo(), None);
        data.tempo = Some(0.0);
        assert_eq!(data.known_tempo(), None);
        data.tempo = Some(128.0);
        assert_eq!(data.known_tempo(), Some(128.0));
    }

    #[test]
    fn test_blank_genre_is_none() {
        let data = MusicAnalysisData {
            genre: Some("   ".to_string()),
            ..MusicAnalysisData::default()
        };
        assert_eq!(data.genre_label(), None);
    }
}
