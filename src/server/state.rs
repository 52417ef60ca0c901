use axum::extract::FromRef;

use crate::analysis::AnalysisOrchestrator;
use crate::analysis_store::AnalysisStore;
use crate::mood::MoodPredictor;
use std::sync::Arc;
use std::time::Instant;

use super::{IdentifierLocks, ServerConfig};

pub type GuardedOrchestrator = Arc<AnalysisOrchestrator>;
pub type GuardedMoodPredictor = Arc<MoodPredictor>;
pub type GuardedAnalysisStore = Arc<dyn AnalysisStore>;
pub type GuardedIdentifierLocks = Arc<IdentifierLocks>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub orchestrator: GuardedOrchestrator,
    pub mood_predictor: GuardedMoodPredictor,
    pub analysis_store: GuardedAnalysisStore,
    pub identifier_locks: GuardedIdentifierLocks,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        orchestrator: GuardedOrchestrator,
        mood_predictor: GuardedMoodPredictor,
    ) -> Self {
        let analysis_store = orchestrator.store().clone();
        Self {
            config,
            start_time: Instant::now(),
            orchestrator,
            mood_predictor,
            analysis_store,
            identifier_locks: Arc::new(IdentifierLocks::default()),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedOrchestrator {
    fn from_ref(input: &ServerState) -> Self {
        input.orchestrator.clone()
    }
}

impl FromRef<ServerState> for GuardedMoodPredictor {
    fn from_ref(input: &ServerState) -> Self {
        input.mood_predictor.clone()
    }
}

impl FromRef<ServerState> for GuardedAnalysisStore {
    fn from_ref(input: &ServerState) -> Self {
        input.analysis_store.clone()
    }
}

impl FromRef<ServerState> for GuardedIdentifierLocks {
    fn from_ref(input: &ServerState) -> Self {
        input.identifier_locks.clone()
    }
}
