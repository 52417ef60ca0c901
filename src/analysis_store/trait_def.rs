//! AnalysisStore trait definition.

use super::models::{AffectRow, AnalysisRecord};
use anyhow::Result;

/// Trait for analysis record storage backends.
///
/// The store is keyed by song id without a uniqueness guarantee; callers
/// check before inserting.
pub trait AnalysisStore: Send + Sync {
    /// Get the record for a song, the earliest one if duplicates exist.
    fn get_record(&self, song_id: &str) -> Result<Option<AnalysisRecord>>;

    /// Get the valence/arousal projection of every row matching the given ids.
    fn get_affect_by_ids(&self, song_ids: &[String]) -> Result<Vec<AffectRow>>;

    /// Insert a record. This is a plain insert, never an upsert.
    fn insert_record(&self, record: &AnalysisRecord) -> Result<()>;

    /// Number of stored rows.
    fn count_records(&self) -> Result<usize>;
}
