//! Maps a (valence, arousal) point to similarity scores against fixed mood
//! anchors in the valence/arousal plane.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named point in the valence/arousal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodAnchor {
    pub name: &'static str,
    pub valence: f64,
    pub arousal: f64,
}

impl MoodAnchor {
    const fn new(name: &'static str, valence: f64, arousal: f64) -> Self {
        Self {
            name,
            valence,
            arousal,
        }
    }

    fn distance_to(&self, valence: f64, arousal: f64) -> f64 {
        (self.valence - valence).hypot(self.arousal - arousal)
    }
}

pub const MOOD_ANCHORS: [MoodAnchor; 5] = [
    MoodAnchor::new("ecstatic", 1.0, 1.0),
    MoodAnchor::new("anxious", -1.0, 1.0),
    MoodAnchor::new("serene", 1.0, -1.0),
    MoodAnchor::new("depressed", -1.0, -1.0),
    MoodAnchor::new("neutral", 0.0, 0.0),
];

/// Diagonal of the [-1, 1] x [-1, 1] square, i.e. sqrt(8).
const MAX_DISTANCE: f64 = 2.0 * std::f64::consts::SQRT_2;

/// Mood name to similarity percentage.
///
/// Scores are independent per anchor and do not sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodDistribution(BTreeMap<String, f64>);

impl MoodDistribution {
    pub fn get(&self, mood: &str) -> Option<f64> {
        self.0.get(mood).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Similarity of `(valence, arousal)` to every mood anchor, in percent,
/// rounded to two decimals.
///
/// Inputs outside [-1, 1] are extrapolated: scores may fall below 0 and are
/// never clamped.
pub fn mood_percentages(valence: f64, arousal: f64) -> MoodDistribution {
    MoodDistribution(
        MOOD_ANCHORS
            .iter()
            .map(|anchor| {
                let similarity = 1.0 - anchor.distance_to(valence, arousal) / MAX_DISTANCE;
                (
                    anchor.name.to_string(),
                    round_to_hundredths(100.0 * similarity),
                )
            })
            .collect(),
    )
}
