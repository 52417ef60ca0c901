use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub temp_audio_dir: Option<String>,
    pub request_timeout_sec: Option<u64>,

    // Feature configs
    pub spotify: Option<SpotifyConfig>,
    pub tools: Option<ToolsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp_path: Option<String>,
    /// Container/codec downloads are extracted to, e.g. "mp3".
    pub audio_format: Option<String>,
    /// Target quality in kbps.
    pub audio_quality: Option<u32>,
    pub search_suffix: Option<String>,
    pub extractor_path: Option<String>,
    pub extractor_profile: Option<String>,
    pub affect_predictor_path: Option<String>,
    pub embedding_model: Option<String>,
    pub affect_model: Option<String>,
    pub tool_timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
