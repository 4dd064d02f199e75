//! Emotion catalog, score maps, and dominant-emotion selection.
//!
//! The catalog is fixed. Declaration order of [`Emotion`] is the catalog
//! order, and it is the tie-breaker whenever two emotions score the same.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Selection policy
// ---------------------------------------------------------------------------

/// Minimum intensity for an emotion to count as dominant.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Maximum number of dominant emotions reported per entry.
pub const DEFAULT_LIMIT: usize = 2;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One of the fixed emotion categories produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Disgust,
}

impl Emotion {
    /// Every emotion, in catalog order.
    pub const ALL: [Emotion; 5] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Disgust,
    ];

    /// Name stored in the `emotions` table and used by the classifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| CoreError::Validation(format!("Unknown emotion: '{}'", s.trim())))
    }
}

/// Parse a comma-separated emotion list such as `"joy,fear"`.
///
/// `None` or an empty string yields the whole catalog. Duplicates are
/// dropped, keeping the first occurrence.
pub fn parse_emotion_list(raw: Option<&str>) -> Result<Vec<Emotion>, CoreError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Emotion::ALL.to_vec()),
        Some(raw) => raw,
    };

    let mut emotions = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let emotion: Emotion = part.parse()?;
        if !emotions.contains(&emotion) {
            emotions.push(emotion);
        }
    }
    if emotions.is_empty() {
        return Ok(Emotion::ALL.to_vec());
    }
    Ok(emotions)
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Per-emotion intensities for one entry, iterated in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmotionScores(BTreeMap<Emotion, f64>);

impl EmotionScores {
    /// Validate a classifier response.
    ///
    /// Every catalog emotion must be present exactly once with a finite
    /// intensity in `[0, 1]`. A repeated name, in any letter case, is an
    /// `InvalidResponse`. Names outside the catalog are ignored.
    pub fn from_classifier<I, K>(named: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut scores = BTreeMap::new();
        for (name, intensity) in named {
            let Ok(emotion) = name.as_ref().parse::<Emotion>() else {
                tracing::warn!(name = name.as_ref(), "Ignoring unknown emotion from classifier");
                continue;
            };
            if !intensity.is_finite() || !(0.0..=1.0).contains(&intensity) {
                return Err(ClassifierError::InvalidResponse(format!(
                    "intensity for {emotion} out of range: {intensity}"
                )));
            }
            if scores.insert(emotion, intensity).is_some() {
                return Err(ClassifierError::InvalidResponse(format!(
                    "response repeats {emotion}"
                )));
            }
        }

        if let Some(missing) = Emotion::ALL.iter().find(|e| !scores.contains_key(e)) {
            return Err(ClassifierError::InvalidResponse(format!(
                "response is missing {missing}"
            )));
        }
        Ok(Self(scores))
    }

    /// Rebuild scores from persisted rows. No completeness check is applied.
    pub fn from_stored(rows: impl IntoIterator<Item = (Emotion, f64)>) -> Self {
        Self(rows.into_iter().collect())
    }

    pub fn get(&self, emotion: Emotion) -> Option<f64> {
        self.0.get(&emotion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.0.iter().map(|(e, i)| (*e, *i))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// An emotion that cleared the selection threshold for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominantEmotion {
    pub emotion: Emotion,
    pub intensity: f64,
}

/// Pick the dominant emotions from a score map.
///
/// Keeps emotions with `intensity >= threshold`, orders them by descending
/// intensity (ties fall back to catalog order), then truncates to `limit`.
/// Returns an empty list when nothing clears the threshold.
pub fn select_dominant(
    scores: &EmotionScores,
    threshold: f64,
    limit: usize,
) -> Vec<DominantEmotion> {
    let mut selected: Vec<DominantEmotion> = scores
        .iter()
        .filter(|(_, intensity)| *intensity >= threshold)
        .map(|(emotion, intensity)| DominantEmotion { emotion, intensity })
        .collect();

    // `sort_by` is stable and `scores` iterates in catalog order.
    selected.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    selected.truncate(limit);
    selected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn scores(pairs: &[(Emotion, f64)]) -> EmotionScores {
        EmotionScores::from_stored(pairs.iter().copied())
    }

    fn full(joy: f64, sadness: f64, anger: f64, fear: f64, disgust: f64) -> EmotionScores {
        scores(&[
            (Emotion::Joy, joy),
            (Emotion::Sadness, sadness),
            (Emotion::Anger, anger),
            (Emotion::Fear, fear),
            (Emotion::Disgust, disgust),
        ])
    }

    // -- Catalog -----------------------------------------------------------

    #[test]
    fn names_round_trip_through_from_str() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.as_str().parse::<Emotion>().unwrap(), emotion);
        }
    }

    #[test]
    fn from_str_is_case_and_space_insensitive() {
        assert_eq!(" JOY ".parse::<Emotion>().unwrap(), Emotion::Joy);
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        assert_matches!("boredom".parse::<Emotion>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn emotion_list_defaults_to_catalog() {
        assert_eq!(parse_emotion_list(None).unwrap(), Emotion::ALL.to_vec());
        assert_eq!(parse_emotion_list(Some("  ")).unwrap(), Emotion::ALL.to_vec());
    }

    #[test]
    fn emotion_list_keeps_order_and_drops_duplicates() {
        let parsed = parse_emotion_list(Some("fear, joy,fear,,joy")).unwrap();
        assert_eq!(parsed, vec![Emotion::Fear, Emotion::Joy]);
    }

    #[test]
    fn emotion_list_rejects_unknown_entries() {
        assert_matches!(
            parse_emotion_list(Some("joy,ennui")),
            Err(CoreError::Validation(_))
        );
    }

    // -- Classifier validation ---------------------------------------------

    #[test]
    fn classifier_scores_require_full_catalog() {
        let result = EmotionScores::from_classifier([("joy", 0.5), ("sadness", 0.1)]);
        assert_matches!(result, Err(ClassifierError::InvalidResponse(_)));
    }

    #[test]
    fn classifier_scores_reject_out_of_range_values() {
        let result = EmotionScores::from_classifier([
            ("joy", 1.5),
            ("sadness", 0.1),
            ("anger", 0.1),
            ("fear", 0.1),
            ("disgust", 0.1),
        ]);
        assert_matches!(result, Err(ClassifierError::InvalidResponse(_)));

        let nan = EmotionScores::from_classifier([
            ("joy", f64::NAN),
            ("sadness", 0.1),
            ("anger", 0.1),
            ("fear", 0.1),
            ("disgust", 0.1),
        ]);
        assert_matches!(nan, Err(ClassifierError::InvalidResponse(_)));
    }

    #[test]
    fn classifier_scores_reject_repeated_names() {
        let result = EmotionScores::from_classifier([
            ("joy", 0.9),
            ("sadness", 0.1),
            ("anger", 0.1),
            ("fear", 0.1),
            ("disgust", 0.1),
            ("Joy", 0.2),
        ]);
        assert_matches!(result, Err(ClassifierError::InvalidResponse(m)) if m.contains("joy"));
    }

    #[test]
    fn classifier_scores_ignore_unknown_names() {
        let result = EmotionScores::from_classifier([
            ("joy", 0.9),
            ("sadness", 0.1),
            ("anger", 0.1),
            ("fear", 0.1),
            ("disgust", 0.1),
            ("surprise", 0.8),
        ])
        .unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result.get(Emotion::Joy), Some(0.9));
    }

    // -- Selection ---------------------------------------------------------

    #[test]
    fn selects_top_two_above_threshold() {
        let s = scores(&[
            (Emotion::Joy, 0.9),
            (Emotion::Sadness, 0.5),
            (Emotion::Anger, 0.1),
        ]);
        let dominant = select_dominant(&s, DEFAULT_THRESHOLD, DEFAULT_LIMIT);
        assert_eq!(
            dominant,
            vec![
                DominantEmotion {
                    emotion: Emotion::Joy,
                    intensity: 0.9,
                },
                DominantEmotion {
                    emotion: Emotion::Sadness,
                    intensity: 0.5,
                },
            ]
        );
    }

    #[test]
    fn nothing_above_threshold_yields_empty() {
        let s = full(0.1, 0.2, 0.29, 0.0, 0.05);
        assert!(select_dominant(&s, DEFAULT_THRESHOLD, DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let s = full(0.3, 0.0, 0.0, 0.0, 0.0);
        let dominant = select_dominant(&s, DEFAULT_THRESHOLD, DEFAULT_LIMIT);
        assert_eq!(dominant.len(), 1);
        assert_eq!(dominant[0].emotion, Emotion::Joy);
    }

    #[test]
    fn orders_by_descending_intensity() {
        let s = full(0.35, 0.4, 0.8, 0.1, 0.0);
        let order: Vec<Emotion> = select_dominant(&s, DEFAULT_THRESHOLD, 5)
            .into_iter()
            .map(|d| d.emotion)
            .collect();
        assert_eq!(order, vec![Emotion::Anger, Emotion::Sadness, Emotion::Joy]);
    }

    #[test]
    fn ties_break_by_catalog_order() {
        let s = full(0.1, 0.6, 0.1, 0.6, 0.6);
        let order: Vec<Emotion> = select_dominant(&s, DEFAULT_THRESHOLD, DEFAULT_LIMIT)
            .into_iter()
            .map(|d| d.emotion)
            .collect();
        assert_eq!(order, vec![Emotion::Sadness, Emotion::Fear]);
    }

    #[test]
    fn limit_zero_yields_empty() {
        let s = full(0.9, 0.9, 0.9, 0.9, 0.9);
        assert!(select_dominant(&s, DEFAULT_THRESHOLD, 0).is_empty());
    }
}
