//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database and temporary
//! audio directory, wired to the fake collaborators in `fixtures`.

use super::constants::*;
use super::fixtures::{
    FakeAffectPredictor, FakeAudioAcquirer, FakeExtractor, FakeMetadataResolver,
};
use affect_analysis_server::analysis::AnalysisOrchestrator;
use affect_analysis_server::analysis_store::{AnalysisStore, SqliteAnalysisStore};
use affect_analysis_server::mood::MoodPredictor;
use affect_analysis_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Store for direct database access in tests
    pub store: Arc<dyn AnalysisStore>,

    acquirer: Arc<FakeAudioAcquirer>,
    db_path: PathBuf,
    temp_audio_dir: PathBuf,

    // Keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database can't be created, the port can't be bound or
    /// the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("analysis.db");
        let temp_audio_dir = temp_dir.path().join("temp_audio");
        std::fs::create_dir_all(&temp_audio_dir).expect("Failed to create temp audio dir");

        let store: Arc<dyn AnalysisStore> =
            Arc::new(SqliteAnalysisStore::new(&db_path).expect("Failed to open analysis store"));
        let acquirer = Arc::new(FakeAudioAcquirer::new(temp_audio_dir.clone()));

        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            Arc::new(FakeMetadataResolver),
            acquirer.clone(),
            Arc::new(FakeExtractor),
            Arc::new(FakeAffectPredictor),
            store.clone(),
        ));
        let mood_predictor = Arc::new(MoodPredictor::new(store.clone()));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        let app = make_app(config, orchestrator, mood_predictor);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            acquirer,
            db_path,
            temp_audio_dir,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Number of downloads the fake acquirer has performed
    pub fn acquisitions(&self) -> usize {
        self.acquirer.calls()
    }

    /// Files left behind in the temporary audio directory
    pub fn leftover_audio_files(&self) -> usize {
        std::fs::read_dir(&self.temp_audio_dir)
            .expect("Failed to read temp audio dir")
            .count()
    }

    /// Runs raw SQL against the analysis database, e.g. to simulate rows
    /// written by other producers
    pub fn execute_sql(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).expect("Failed to open database");
        conn.execute_batch(sql).expect("Failed to execute SQL");
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
