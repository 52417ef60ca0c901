mod file_config;

pub use file_config::{FileConfig, SpotifyConfig, ToolsConfig};

use crate::acquisition::YtDlpSettings;
use crate::extraction::{EssentiaAffectSettings, EssentiaExtractorSettings};
use crate::metadata::SpotifyCredentials;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::warn;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub temp_audio_dir: Option<PathBuf>,
    pub request_timeout_sec: u64,
    pub tool_timeout_sec: u64,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub temp_audio_dir: PathBuf,
    pub request_timeout_sec: u64,
    pub spotify: Option<SpotifyCredentials>,
    pub tools: ToolsSettings,
}

/// External executables and models the pipeline runs.
#[derive(Debug, Clone)]
pub struct ToolsSettings {
    pub yt_dlp_path: String,
    pub audio_format: String,
    pub audio_quality: u32,
    pub search_suffix: String,
    pub extractor_path: String,
    pub extractor_profile: Option<PathBuf>,
    pub affect_predictor_path: String,
    pub embedding_model: PathBuf,
    pub affect_model: PathBuf,
    pub tool_timeout_sec: u64,
}

impl ToolsSettings {
    fn resolve(file: ToolsConfig, tool_timeout_sec: u64) -> Self {
        let yt_dlp = YtDlpSettings::default();
        let extractor = EssentiaExtractorSettings::default();
        let affect = EssentiaAffectSettings::default();
        Self {
            yt_dlp_path: file.yt_dlp_path.unwrap_or(yt_dlp.executable),
            audio_format: file.audio_format.unwrap_or(yt_dlp.audio_format),
            audio_quality: file.audio_quality.unwrap_or(yt_dlp.audio_quality),
            search_suffix: file.search_suffix.unwrap_or(yt_dlp.search_suffix),
            extractor_path: file.extractor_path.unwrap_or(extractor.executable),
            extractor_profile: file.extractor_profile.map(PathBuf::from),
            affect_predictor_path: file.affect_predictor_path.unwrap_or(affect.executable),
            embedding_model: file
                .embedding_model
                .map(PathBuf::from)
                .unwrap_or(affect.embedding_model),
            affect_model: file
                .affect_model
                .map(PathBuf::from)
                .unwrap_or(affect.affect_model),
            tool_timeout_sec: file.tool_timeout_sec.unwrap_or(tool_timeout_sec),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = match file.logging_level {
            Some(level) => parse_logging_level(&level).unwrap_or_else(|| {
                warn!(
                    "Invalid logging_level '{}' in config file, using {}",
                    level, cli.logging_level
                );
                cli.logging_level.clone()
            }),
            None => cli.logging_level.clone(),
        };

        let temp_audio_dir = file
            .temp_audio_dir
            .map(PathBuf::from)
            .or_else(|| cli.temp_audio_dir.clone())
            .unwrap_or_else(|| db_dir.join("temp_audio"));

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);

        let spotify_file = file.spotify.unwrap_or_default();
        let client_id = spotify_file
            .client_id
            .or_else(|| cli.spotify_client_id.clone());
        let client_secret = spotify_file
            .client_secret
            .or_else(|| cli.spotify_client_secret.clone());
        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("Both the Spotify client id and client secret must be provided"),
        };

        let tools = ToolsSettings::resolve(file.tools.unwrap_or_default(), cli.tool_timeout_sec);

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            temp_audio_dir,
            request_timeout_sec,
            spotify,
            tools,
        })
    }

    pub fn analysis_db_path(&self) -> PathBuf {
        self.db_dir.join("analysis.db")
    }

    pub fn yt_dlp_settings(&self) -> YtDlpSettings {
        YtDlpSettings {
            executable: self.tools.yt_dlp_path.clone(),
            temp_dir: self.temp_audio_dir.clone(),
            audio_format: self.tools.audio_format.clone(),
            audio_quality: self.tools.audio_quality,
            search_suffix: self.tools.search_suffix.clone(),
            timeout_sec: self.tools.tool_timeout_sec,
        }
    }

    pub fn extractor_settings(&self) -> EssentiaExtractorSettings {
        EssentiaExtractorSettings {
            executable: self.tools.extractor_path.clone(),
            profile: self.tools.extractor_profile.clone(),
            timeout_sec: self.tools.tool_timeout_sec,
        }
    }

    pub fn affect_settings(&self) -> EssentiaAffectSettings {
        EssentiaAffectSettings {
            executable: self.tools.affect_predictor_path.clone(),
            embedding_model: self.tools.embedding_model.clone(),
            affect_model: self.tools.affect_model.clone(),
            timeout_sec: self.tools.tool_timeout_sec,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
