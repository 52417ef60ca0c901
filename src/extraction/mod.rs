//! Descriptor extraction and affect prediction over a local audio file.
//!
//! Both run the Essentia tooling as external processes; neither writes to the
//! audio file, so the two can run concurrently on the same asset.

mod affect;
mod descriptors;
mod essentia;
mod process;

pub use affect::{normalize_predictions, EssentiaAffectPredictor, EssentiaAffectSettings};
pub use descriptors::flatten_descriptors;
pub use essentia::{EssentiaExtractor, EssentiaExtractorSettings};

use crate::analysis_store::{AffectPrediction, DescriptorSet, Embedding};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during descriptor extraction or affect prediction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("No affect predictions were produced")]
    EmptyPrediction,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes the named acoustic descriptors of an audio file.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn extract(&self, audio_path: &Path) -> Result<DescriptorSet, ExtractionError>;
}

/// Computes the embedding and per-frame valence/arousal of an audio file.
#[async_trait]
pub trait AffectPredictor: Send + Sync {
    async fn predict(
        &self,
        audio_path: &Path,
    ) -> Result<(Embedding, AffectPrediction), ExtractionError>;
}
