use super::AnalysisError;
use crate::acquisition::AudioAcquirer;
use crate::analysis_store::{with_store, AnalysisRecord, AnalysisStore};
use crate::extraction::{AffectPredictor, FeatureExtractor};
use crate::metadata::MetadataResolver;
use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Coordinates metadata lookup, download, extraction and persistence into a
/// single idempotent `analyze` operation.
///
/// There is no locking between concurrent calls for the same id: both may run
/// the full pipeline and both may insert. Callers that need at most one row
/// per id serialize calls themselves.
pub struct AnalysisOrchestrator {
    resolver: Arc<dyn MetadataResolver>,
    acquirer: Arc<dyn AudioAcquirer>,
    extractor: Arc<dyn FeatureExtractor>,
    predictor: Arc<dyn AffectPredictor>,
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisOrchestrator {
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        acquirer: Arc<dyn AudioAcquirer>,
        extractor: Arc<dyn FeatureExtractor>,
        predictor: Arc<dyn AffectPredictor>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            resolver,
            acquirer,
            extractor,
            predictor,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Returns the stored record for `song_id`, analyzing the track first if
    /// no record exists yet.
    pub async fn analyze(&self, song_id: &str) -> Result<AnalysisRecord, AnalysisError> {
        match self.find_record(song_id).await {
            Ok(Some(record)) => {
                debug!("Analysis of {} served from store", song_id);
                metrics::record_analysis_outcome("cached");
                return Ok(record);
            }
            Ok(None) => {}
            Err(err) => {
                metrics::record_analysis_outcome(err.kind());
                return Err(err);
            }
        }

        let start = Instant::now();
        let result = self.analyze_uncached(song_id).await;
        match &result {
            Ok(record) => {
                info!(
                    "Analyzed {} in {:?}: valence {:.3}, arousal {:.3}",
                    song_id,
                    start.elapsed(),
                    record.valence,
                    record.arousal
                );
                metrics::record_analysis_outcome("analyzed");
            }
            Err(err) => {
                warn!("Analysis of {} failed after {:?}: {}", song_id, start.elapsed(), err);
                metrics::record_analysis_outcome(err.kind());
            }
        }
        result
    }

    async fn find_record(&self, song_id: &str) -> Result<Option<AnalysisRecord>, AnalysisError> {
        let id = song_id.to_string();
        Ok(with_store(&self.store, move |store| store.get_record(&id)).await?)
    }

    async fn analyze_uncached(&self, song_id: &str) -> Result<AnalysisRecord, AnalysisError> {
        let stage_start = Instant::now();
        let metadata = self.resolver.resolve(song_id).await?;
        metrics::record_stage_duration("metadata", stage_start.elapsed());
        debug!(
            "Resolved {} to '{}' by '{}'",
            song_id, metadata.title, metadata.artist
        );

        // The asset deletes its file when it goes out of scope, on every path
        // out of this function.
        let stage_start = Instant::now();
        let asset = self.acquirer.acquire(&metadata).await?;
        metrics::record_stage_duration("acquisition", stage_start.elapsed());
        debug!("Acquired audio for {} at {:?}", song_id, asset.path());

        let stage_start = Instant::now();
        let (descriptors, prediction) = tokio::join!(
            self.extractor.extract(asset.path()),
            self.predictor.predict(asset.path())
        );
        metrics::record_stage_duration("extraction", stage_start.elapsed());
        let descriptors = descriptors?;
        let (embedding, affect) = prediction?;

        let record = AnalysisRecord {
            song_id: song_id.to_string(),
            descriptors,
            embedding,
            valence: affect.valence_average,
            arousal: affect.arousal_average,
            affect,
        };

        let stage_start = Instant::now();
        let id = song_id.to_string();
        let stored = with_store(&self.store, move |store| {
            store.insert_record(&record)?;
            store.get_record(&id)
        })
        .await?;
        metrics::record_stage_duration("persistence", stage_start.elapsed());

        stored.ok_or_else(|| {
            AnalysisError::PersistenceFailed(format!("{} missing after insert", song_id))
        })
    }
}
