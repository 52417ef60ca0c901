//! Valence/arousal prediction with the MusiCNN embedding model and the DEAM
//! regression head.
//!
//! The prediction executable prints raw model outputs; normalization to
//! [-1, 1] happens here and is scoped to a single run: min and max are taken
//! over the frames of the current track only, never over a running or global
//! statistic. The same audio analyzed twice can therefore normalize slightly
//! differently when frame segmentation differs.

use super::process::run_tool;
use super::{AffectPredictor, ExtractionError};
use crate::analysis_store::{AffectPrediction, Embedding};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const TOOL_NAME: &str = "affect predictor";

#[derive(Debug, Clone)]
pub struct EssentiaAffectSettings {
    /// Executable wrapping the Essentia TensorFlow predictors.
    pub executable: String,
    pub embedding_model: PathBuf,
    pub affect_model: PathBuf,
    pub timeout_sec: u64,
}

impl Default for EssentiaAffectSettings {
    fn default() -> Self {
        Self {
            executable: "essentia-affect-predict".to_string(),
            embedding_model: PathBuf::from("msd-musicnn-1.pb"),
            affect_model: PathBuf::from("deam-msd-musicnn-2.pb"),
            timeout_sec: 300,
        }
    }
}

#[derive(Deserialize)]
struct RawPredictorOutput {
    embeddings: Embedding,
    predictions: Vec<Vec<f64>>,
}

pub struct EssentiaAffectPredictor {
    settings: EssentiaAffectSettings,
}

impl EssentiaAffectPredictor {
    pub fn new(settings: EssentiaAffectSettings) -> Self {
        Self { settings }
    }
}

/// Min-max normalizes each column of `raw` to [-1, 1] and averages it.
///
/// A column whose values are all equal has its range replaced by 1, mapping
/// every value to -1.
pub fn normalize_predictions(raw: &[[f64; 2]]) -> Result<AffectPrediction, ExtractionError> {
    if raw.is_empty() {
        return Err(ExtractionError::EmptyPrediction);
    }

    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for frame in raw {
        for column in 0..2 {
            min[column] = min[column].min(frame[column]);
            max[column] = max[column].max(frame[column]);
        }
    }
    let range = [0, 1].map(|column| {
        let range = max[column] - min[column];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    });

    let predictions: Vec<[f64; 2]> = raw
        .iter()
        .map(|frame| [0, 1].map(|column| 2.0 * (frame[column] - min[column]) / range[column] - 1.0))
        .collect();

    let frames = predictions.len() as f64;
    let valence_average = predictions.iter().map(|p| p[0]).sum::<f64>() / frames;
    let arousal_average = predictions.iter().map(|p| p[1]).sum::<f64>() / frames;

    Ok(AffectPrediction {
        predictions,
        valence_average,
        arousal_average,
    })
}

fn parse_output(stdout: &[u8]) -> Result<(Embedding, Vec<[f64; 2]>), ExtractionError> {
    let output: RawPredictorOutput = serde_json::from_slice(stdout)
        .map_err(|e| ExtractionError::InvalidOutput(format!("JSON parse error: {}", e)))?;

    let frames = output
        .predictions
        .iter()
        .enumerate()
        .map(|(i, frame)| match frame.as_slice() {
            [valence, arousal] => Ok([*valence, *arousal]),
            _ => Err(ExtractionError::InvalidOutput(format!(
                "frame {} has {} values, expected 2",
                i,
                frame.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((output.embeddings, frames))
}

#[async_trait]
impl AffectPredictor for EssentiaAffectPredictor {
    async fn predict(
        &self,
        audio_path: &Path,
    ) -> Result<(Embedding, AffectPrediction), ExtractionError> {
        info!("Running embedding and valence/arousal models on {:?}", audio_path);
        let mut command = Command::new(&self.settings.executable);
        command
            .arg("--embedding-model")
            .arg(&self.settings.embedding_model)
            .arg("--affect-model")
            .arg(&self.settings.affect_model)
            .arg(audio_path);
        let output = run_tool(TOOL_NAME, command, self.settings.timeout_sec).await?;

        let (embedding, raw) = parse_output(&output.stdout)?;
        let affect = normalize_predictions(&raw)?;
        debug!(
            "Affect prediction over {} frames: valence {:.3}, arousal {:.3}",
            affect.predictions.len(),
            affect.valence_average,
            affect.arousal_average
        );
        Ok((embedding, affect))
    }
}
