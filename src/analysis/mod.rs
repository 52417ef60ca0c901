//! Turns a track identifier into a persisted analysis record.

mod error;
mod orchestrator;

pub use error::AnalysisError;
pub use orchestrator::AnalysisOrchestrator;
