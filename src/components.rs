//! Wires the concrete collaborators of the analysis pipeline from the
//! resolved configuration.

use crate::acquisition::YtDlpAcquirer;
use crate::analysis::AnalysisOrchestrator;
use crate::analysis_store::{AnalysisStore, SqliteAnalysisStore};
use crate::config::AppConfig;
use crate::extraction::{EssentiaAffectPredictor, EssentiaExtractor};
use crate::metadata::SpotifyMetadataClient;
use crate::mood::MoodPredictor;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub struct Components {
    pub store: Arc<dyn AnalysisStore>,
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub mood_predictor: Arc<MoodPredictor>,
}

pub fn open_store(config: &AppConfig) -> Result<Arc<dyn AnalysisStore>> {
    let db_path = config.analysis_db_path();
    info!("Opening SQLite analysis database at {:?}...", db_path);
    Ok(Arc::new(SqliteAnalysisStore::new(&db_path)?))
}

pub fn build_components(config: &AppConfig) -> Result<Components> {
    let credentials = config.spotify.clone().context(
        "Spotify credentials are required: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET \
         or the [spotify] section of the config file",
    )?;

    std::fs::create_dir_all(&config.temp_audio_dir).with_context(|| {
        format!(
            "Failed to create temporary audio directory {:?}",
            config.temp_audio_dir
        )
    })?;

    let store = open_store(config)?;
    let resolver = SpotifyMetadataClient::new(credentials, config.request_timeout_sec)?;
    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        Arc::new(resolver),
        Arc::new(YtDlpAcquirer::new(config.yt_dlp_settings())),
        Arc::new(EssentiaExtractor::new(config.extractor_settings())),
        Arc::new(EssentiaAffectPredictor::new(config.affect_settings())),
        store.clone(),
    ));
    let mood_predictor = Arc::new(MoodPredictor::new(store.clone()));

    Ok(Components {
        store,
        orchestrator,
        mood_predictor,
    })
}
