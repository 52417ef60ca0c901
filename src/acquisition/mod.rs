//! Audio acquisition: search for a track and download it as a local file.

mod asset;
mod yt_dlp;

pub use asset::AudioAsset;
pub use yt_dlp::{YtDlpAcquirer, YtDlpSettings};

use crate::metadata::TrackMetadata;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while acquiring audio.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("No match found for '{0}'")]
    NoMatch(String),

    #[error("Downloader failed: {0}")]
    DownloadFailed(String),

    #[error("Downloaded file not found: {0}")]
    NoOutput(String),

    #[error("Downloader timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces a fresh, exclusively-owned local audio file for a track.
///
/// Implementations must never hand out the same file twice: the same
/// artist/title requested twice results in two independent downloads.
#[async_trait]
pub trait AudioAcquirer: Send + Sync {
    async fn acquire(&self, metadata: &TrackMetadata) -> Result<AudioAsset, AcquisitionError>;
}
