use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};
use crate::analysis::{AnalysisError, AnalysisOrchestrator};
use crate::analysis_store::with_store;
use crate::metrics;
use crate::mood::{MoodError, MoodPredictor};
use std::sync::Arc;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub records: Option<usize>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Deserialize, Debug)]
struct AnalyzeParams {
    songid: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MoodBody {
    song_ids: Vec<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(status: StatusCode, kind: &'static str) -> Response {
    (status, Json(ErrorBody { error: kind })).into_response()
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        error_response(StatusCode::NOT_FOUND, self.kind())
    }
}

impl IntoResponse for MoodError {
    fn into_response(self) -> Response {
        error_response(StatusCode::NOT_FOUND, self.kind())
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let records = match with_store(&state.analysis_store, |store| store.count_records()).await {
        Ok(count) => Some(count),
        Err(err) => {
            error!("Failed to count records: {:#}", err);
            None
        }
    };
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        records,
    })
}

async fn analyze_track(state: &ServerState, song_id: &str) -> Response {
    let song_id = song_id.trim();
    if song_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "MissingIdentifier");
    }

    let _guard = state.identifier_locks.lock(song_id).await;
    debug!("Analyze request for {}", song_id);
    match state.orchestrator.analyze(song_id).await {
        Ok(record) => Json(record).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn analyze(
    State(state): State<ServerState>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    match params.songid {
        Some(song_id) => analyze_track(&state, &song_id).await,
        None => error_response(StatusCode::BAD_REQUEST, "MissingIdentifier"),
    }
}

async fn get_track_analysis(
    State(state): State<ServerState>,
    Path(song_id): Path<String>,
) -> Response {
    analyze_track(&state, &song_id).await
}

async fn predict_mood(
    State(mood_predictor): State<GuardedMoodPredictor>,
    body: Result<Json<MoodBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!("Rejected mood request body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "MalformedRequest");
        }
    };

    let song_ids: Vec<String> = body
        .song_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if song_ids.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "MissingIdentifier");
    }

    match mood_predictor.predict_for_tracks(&song_ids).await {
        Ok(prediction) => Json(prediction).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_app(
    config: ServerConfig,
    orchestrator: Arc<AnalysisOrchestrator>,
    mood_predictor: Arc<MoodPredictor>,
) -> Router {
    let state = ServerState::new(config, orchestrator, mood_predictor);

    let analysis_routes: Router = Router::new()
        .route("/analyze", get(analyze))
        .route("/track/{id}", get(get_track_analysis))
        .route("/mood", post(predict_mood))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/analysis", analysis_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    orchestrator: Arc<AnalysisOrchestrator>,
    mood_predictor: Arc<MoodPredictor>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, orchestrator, mood_predictor);

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server failed: {}", e);
        }
    });
    info!("Metrics available at port {}!", metrics_port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Ready to serve at port {}!", port);

    Ok(axum::serve(listener, app).await?)
}
