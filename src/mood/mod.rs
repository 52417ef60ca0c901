//! Mood profile of one or more analyzed tracks.

mod model;
mod predictor;

pub use model::{mood_percentages, MoodAnchor, MoodDistribution, MOOD_ANCHORS};
pub use predictor::{MoodError, MoodPrediction, MoodPredictor};
