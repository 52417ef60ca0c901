//! Spotify Web API client resolving track ids to artist and title.
//!
//! Uses the client credentials flow; the access token is cached until shortly
//! before it expires.

use super::{MetadataError, MetadataResolver, TrackMetadata};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

pub struct SpotifyMetadataClient {
    client: reqwest::Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
}

/// The first listed artist is the track's artist.
fn metadata_from_track(song_id: &str, track: SpotifyTrack) -> Result<TrackMetadata, MetadataError> {
    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .ok_or_else(|| MetadataError::NotFound(format!("{} has no artists", song_id)))?;
    Ok(TrackMetadata {
        artist,
        title: track.name,
    })
}

impl SpotifyMetadataClient {
    pub fn new(credentials: SpotifyCredentials, timeout_sec: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;
        Ok(Self {
            client,
            credentials,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, MetadataError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.value.clone());
            }
        }

        debug!("Requesting new Spotify access token");
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let response = self
            .client
            .post(SPOTIFY_ACCOUNTS_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::InvalidResponse(e.to_string()))?;

        let value = body.access_token.clone();
        *token = Some(CachedToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }
}

#[async_trait]
impl MetadataResolver for SpotifyMetadataClient {
    async fn resolve(&self, song_id: &str) -> Result<TrackMetadata, MetadataError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/tracks/{}",
            SPOTIFY_API_BASE,
            urlencoding::encode(song_id)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                return Err(MetadataError::NotFound(song_id.to_string()));
            }
            status => {
                return Err(MetadataError::Request(format!(
                    "track lookup returned {}",
                    status
                )));
            }
        }

        let track: SpotifyTrack = response
            .json()
            .await
            .map_err(|e| MetadataError::InvalidResponse(e.to_string()))?;
        let metadata = metadata_from_track(song_id, track)?;
        info!(
            "Found track '{}' by {} for {}",
            metadata.title, metadata.artist, song_id
        );
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_uses_first_artist() {
        let track: SpotifyTrack = serde_json::from_str(
            r#"{"name": "Harder, Better", "artists": [{"name": "Daft Punk"}, {"name": "Other"}]}"#,
        )
        .unwrap();

        let metadata = metadata_from_track("abc", track).unwrap();
        assert_eq!(metadata.artist, "Daft Punk");
        assert_eq!(metadata.title, "Harder, Better");
    }

    #[test]
    fn test_track_without_artists_is_not_found() {
        let track: SpotifyTrack = serde_json::from_str(r#"{"name": "Untitled"}"#).unwrap();
        let result = metadata_from_track("abc", track);
        assert!(matches!(result, Err(MetadataError::NotFound(_))));
    }

    #[test]
    fn test_token_freshness_respects_margin() {
        let now = Instant::now();
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::from_secs(3600),
        };
        let nearly_expired = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!nearly_expired.is_fresh(now));
    }
}
