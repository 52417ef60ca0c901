use super::model::{mood_percentages, MoodDistribution};
use crate::analysis_store::{with_store, AffectRow, AnalysisStore};
use crate::metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum MoodError {
    #[error("None of the requested tracks have been analyzed")]
    NotFound,

    #[error("No analyzed track carries both valence and arousal")]
    MissingAffectData,

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

impl MoodError {
    pub fn kind(&self) -> &'static str {
        match self {
            MoodError::NotFound => "NotFound",
            MoodError::MissingAffectData => "MissingAffectData",
            MoodError::PersistenceFailed(_) => "PersistenceFailed",
        }
    }
}

/// Average affect of a set of tracks and its mood profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodPrediction {
    pub valence: f64,
    pub arousal: f64,
    pub mood_percentages: MoodDistribution,
}

/// Averages the stored valence/arousal of `rows`.
///
/// Rows lacking either value are left out of the average entirely.
fn average_affect(rows: &[AffectRow]) -> Result<(f64, f64), MoodError> {
    if rows.is_empty() {
        return Err(MoodError::NotFound);
    }
    let complete: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.valence?, row.arousal?)))
        .collect();
    if complete.is_empty() {
        return Err(MoodError::MissingAffectData);
    }

    let count = complete.len() as f64;
    let valence = complete.iter().map(|(v, _)| v).sum::<f64>() / count;
    let arousal = complete.iter().map(|(_, a)| a).sum::<f64>() / count;
    Ok((valence, arousal))
}

pub struct MoodPredictor {
    store: Arc<dyn AnalysisStore>,
}

impl MoodPredictor {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    pub async fn predict_for_tracks(&self, song_ids: &[String]) -> Result<MoodPrediction, MoodError> {
        let ids = song_ids.to_vec();
        let rows = with_store(&self.store, move |store| store.get_affect_by_ids(&ids))
            .await
            .map_err(|e| {
                error!("Failed to read affect rows: {:#}", e);
                MoodError::PersistenceFailed(format!("{:#}", e))
            });

        let result = rows.and_then(|rows| {
            debug!(
                "Found {} affect rows for {} requested tracks",
                rows.len(),
                song_ids.len()
            );
            let (valence, arousal) = average_affect(&rows)?;
            Ok(MoodPrediction {
                valence,
                arousal,
                mood_percentages: mood_percentages(valence, arousal),
            })
        });

        match &result {
            Ok(_) => metrics::record_mood_prediction("success"),
            Err(err) => metrics::record_mood_prediction(err.kind()),
        }
        result
    }
}
