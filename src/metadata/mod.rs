//! Track metadata resolution (track id -> artist and title).

mod spotify;

pub use spotify::{SpotifyCredentials, SpotifyMetadataClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Artist and title of a track, only used to drive audio acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
}

/// Errors that can occur while resolving track metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Track not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Resolves a track identifier into its artist and title.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, song_id: &str) -> Result<TrackMetadata, MetadataError>;
}
