//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for all analysis server
//! endpoints. When API routes or request formats change, update only this
//! file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Stats request failed")
    }

    // ========================================================================
    // Analysis Endpoints
    // ========================================================================

    /// GET /v1/analysis/analyze?songid={song_id}
    pub async fn analyze(&self, song_id: &str) -> Response {
        self.client
            .get(format!("{}/v1/analysis/analyze", self.base_url))
            .query(&[("songid", song_id)])
            .send()
            .await
            .expect("Analyze request failed")
    }

    /// GET /v1/analysis/analyze without the songid parameter
    pub async fn analyze_without_id(&self) -> Response {
        self.client
            .get(format!("{}/v1/analysis/analyze", self.base_url))
            .send()
            .await
            .expect("Analyze request failed")
    }

    /// GET /v1/analysis/track/{song_id}
    pub async fn get_track_analysis(&self, song_id: &str) -> Response {
        self.client
            .get(format!("{}/v1/analysis/track/{}", self.base_url, song_id))
            .send()
            .await
            .expect("Track analysis request failed")
    }

    // ========================================================================
    // Mood Endpoints
    // ========================================================================

    /// POST /v1/analysis/mood
    pub async fn predict_mood(&self, song_ids: &[&str]) -> Response {
        self.client
            .post(format!("{}/v1/analysis/mood", self.base_url))
            .json(&json!({ "song_ids": song_ids }))
            .send()
            .await
            .expect("Mood request failed")
    }
}
