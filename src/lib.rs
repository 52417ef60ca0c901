//! Affect Analysis Server Library
//!
//! This library exposes the internal modules for testing and reuse by the
//! binaries.

pub mod acquisition;
pub mod analysis;
pub mod analysis_store;
pub mod components;
pub mod config;
pub mod extraction;
pub mod metadata;
pub mod metrics;
pub mod mood;
pub mod server;
pub mod sqlite_persistence;
pub mod tool_runner;

// Re-export commonly used types for convenience
pub use analysis::{AnalysisError, AnalysisOrchestrator};
pub use analysis_store::{AnalysisStore, SqliteAnalysisStore};
pub use mood::{mood_percentages, MoodPredictor};
pub use server::{run_server, RequestsLoggingLevel};
