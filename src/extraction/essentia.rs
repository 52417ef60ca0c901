//! Descriptor extraction with the Essentia music extractor executable.

use super::descriptors::flatten_descriptors;
use super::process::run_tool;
use super::{ExtractionError, FeatureExtractor};
use crate::analysis_store::DescriptorSet;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const TOOL_NAME: &str = "essentia music extractor";

#[derive(Debug, Clone)]
pub struct EssentiaExtractorSettings {
    /// Path or name of `essentia_streaming_extractor_music`.
    pub executable: String,
    /// Optional extractor profile (YAML) passed as third argument.
    pub profile: Option<PathBuf>,
    pub timeout_sec: u64,
}

impl Default for EssentiaExtractorSettings {
    fn default() -> Self {
        Self {
            executable: "essentia_streaming_extractor_music".to_string(),
            profile: None,
            timeout_sec: 300,
        }
    }
}

pub struct EssentiaExtractor {
    settings: EssentiaExtractorSettings,
}

impl EssentiaExtractor {
    pub fn new(settings: EssentiaExtractorSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FeatureExtractor for EssentiaExtractor {
    async fn extract(&self, audio_path: &Path) -> Result<DescriptorSet, ExtractionError> {
        if !audio_path.exists() {
            return Err(ExtractionError::InvalidOutput(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        // Removed when dropped, after parsing.
        let output_file = tempfile::Builder::new()
            .prefix("descriptors-")
            .suffix(".json")
            .tempfile()?;

        info!("Analyzing {:?} with Essentia", audio_path);
        let mut command = Command::new(&self.settings.executable);
        command.arg(audio_path).arg(output_file.path());
        if let Some(profile) = &self.settings.profile {
            command.arg(profile);
        }
        run_tool(TOOL_NAME, command, self.settings.timeout_sec).await?;

        let raw = tokio::fs::read_to_string(output_file.path()).await?;
        let json: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ExtractionError::InvalidOutput(format!("JSON parse error: {}", e)))?;
        if !json.is_object() {
            return Err(ExtractionError::InvalidOutput(
                "extractor output is not a JSON object".to_string(),
            ));
        }

        let descriptors = flatten_descriptors(&json);
        debug!("Extracted {} descriptors", descriptors.len());
        Ok(descriptors)
    }
}
