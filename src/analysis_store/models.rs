//! Data models for the analysis database.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single named descriptor produced by the feature extractor.
///
/// The extractor output has no fixed schema, values are persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    Scalar(f64),
    Text(String),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

/// Descriptor name (e.g. `rhythm.bpm`) to value, sorted by name.
pub type DescriptorSet = BTreeMap<String, DescriptorValue>;

/// Frame-wise embedding matrix the affect predictions were computed from.
pub type Embedding = Vec<Vec<f64>>;

/// Per-frame valence/arousal predictions of one run.
///
/// Every component is in [-1, 1]: min/max normalization is taken over the
/// frames of this run only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectPrediction {
    /// One `[valence, arousal]` pair per frame.
    pub predictions: Vec<[f64; 2]>,
    pub valence_average: f64,
    pub arousal_average: f64,
}

/// The persisted result of analyzing one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub song_id: String,
    pub descriptors: DescriptorSet,
    pub embedding: Embedding,
    pub valence: f64,
    pub arousal: f64,
    pub affect: AffectPrediction,
}

/// Narrow projection of a stored row used by mood prediction.
///
/// Rows written by other producers may lack either field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectRow {
    pub song_id: String,
    pub valence: Option<f64>,
    pub arousal: Option<f64>,
}
