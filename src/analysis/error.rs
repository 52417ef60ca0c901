use crate::acquisition::AcquisitionError;
use crate::extraction::ExtractionError;
use crate::metadata::MetadataError;
use thiserror::Error;

/// Errors that can end an analysis attempt.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The track could not be resolved or no audio could be obtained for it.
    #[error("Track not found: {0}")]
    NotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

impl AnalysisError {
    /// Stable name of the error kind, used in responses and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::NotFound(_) => "NotFound",
            AnalysisError::ExtractionFailed(_) => "ExtractionFailed",
            AnalysisError::PersistenceFailed(_) => "PersistenceFailed",
        }
    }
}

impl From<MetadataError> for AnalysisError {
    fn from(err: MetadataError) -> Self {
        AnalysisError::NotFound(err.to_string())
    }
}

impl From<AcquisitionError> for AnalysisError {
    fn from(err: AcquisitionError) -> Self {
        AnalysisError::NotFound(err.to_string())
    }
}

impl From<ExtractionError> for AnalysisError {
    fn from(err: ExtractionError) -> Self {
        AnalysisError::ExtractionFailed(err.to_string())
    }
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        AnalysisError::PersistenceFailed(format!("{:#}", err))
    }
}
