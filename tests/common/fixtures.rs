//! Fake pipeline collaborators
//!
//! The fake acquirer writes the affect values a track should analyze to into
//! the downloaded file; the fake extractor and predictor read them back, so
//! each track yields stable, known results without any external tool.

use super::constants::*;
use affect_analysis_server::acquisition::{AcquisitionError, AudioAcquirer, AudioAsset};
use affect_analysis_server::analysis_store::{
    AffectPrediction, DescriptorSet, DescriptorValue, Embedding,
};
use affect_analysis_server::extraction::{AffectPredictor, ExtractionError, FeatureExtractor};
use affect_analysis_server::metadata::{MetadataError, MetadataResolver, TrackMetadata};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const BROKEN_AUDIO_CONTENT: &str = "broken";

pub struct FakeMetadataResolver;

#[async_trait]
impl MetadataResolver for FakeMetadataResolver {
    async fn resolve(&self, song_id: &str) -> Result<TrackMetadata, MetadataError> {
        let title = match song_id {
            TRACK_A_ID => "Song A",
            TRACK_B_ID => "Song B",
            BROKEN_AUDIO_TRACK_ID => "Broken Song",
            NO_AUDIO_TRACK_ID => "Missing Song",
            _ => return Err(MetadataError::NotFound(song_id.to_string())),
        };
        Ok(TrackMetadata {
            artist: "Test Artist".to_string(),
            title: title.to_string(),
        })
    }
}

pub struct FakeAudioAcquirer {
    dir: PathBuf,
    calls: AtomicUsize,
}

impl FakeAudioAcquirer {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioAcquirer for FakeAudioAcquirer {
    async fn acquire(&self, metadata: &TrackMetadata) -> Result<AudioAsset, AcquisitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(FAKE_DOWNLOAD_DELAY_MS)).await;

        let content = match metadata.title.as_str() {
            "Song A" => format!("{},{}", TRACK_A_AFFECT.0, TRACK_A_AFFECT.1),
            "Song B" => format!("{},{}", TRACK_B_AFFECT.0, TRACK_B_AFFECT.1),
            "Broken Song" => BROKEN_AUDIO_CONTENT.to_string(),
            _ => return Err(AcquisitionError::NoMatch(metadata.title.clone())),
        };

        let path = self
            .dir
            .join(format!("{} - {}-{}.mp3", metadata.artist, metadata.title, call));
        std::fs::write(&path, content)?;
        Ok(AudioAsset::new(path))
    }
}

pub struct FakeExtractor;

#[async_trait]
impl FeatureExtractor for FakeExtractor {
    async fn extract(&self, audio_path: &Path) -> Result<DescriptorSet, ExtractionError> {
        let content = std::fs::read_to_string(audio_path)?;
        if content == BROKEN_AUDIO_CONTENT {
            return Err(ExtractionError::ToolFailed {
                tool: "fake extractor".to_string(),
                message: "unsupported codec".to_string(),
            });
        }

        let mut descriptors = DescriptorSet::new();
        descriptors.insert("rhythm.bpm".to_string(), DescriptorValue::Scalar(120.0));
        descriptors.insert(
            "lowlevel.mfcc.mean".to_string(),
            DescriptorValue::Vector(vec![1.0, 2.0, 3.0]),
        );
        descriptors.insert(
            "tonal.key_edma.scale".to_string(),
            DescriptorValue::Text("major".to_string()),
        );
        Ok(descriptors)
    }
}

pub struct FakeAffectPredictor;

#[async_trait]
impl AffectPredictor for FakeAffectPredictor {
    async fn predict(
        &self,
        audio_path: &Path,
    ) -> Result<(Embedding, AffectPrediction), ExtractionError> {
        let content = std::fs::read_to_string(audio_path)?;
        let values: Vec<f64> = content
            .split(',')
            .map(|v| v.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;
        let &[valence, arousal] = values.as_slice() else {
            return Err(ExtractionError::InvalidOutput(content));
        };

        Ok((
            vec![vec![0.1, 0.2, 0.3]],
            AffectPrediction {
                predictions: vec![[valence, arousal]],
                valence_average: valence,
                arousal_average: arousal,
            },
        ))
    }
}
