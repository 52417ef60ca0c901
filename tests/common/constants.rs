//! Shared constants for end-to-end tests
//!
//! When test data changes (track ids, affect values, ...), update only this
//! file.

// ============================================================================
// Test Track IDs
// ============================================================================

/// Resolves, downloads and analyzes to valence 0.2, arousal 0.4
pub const TRACK_A_ID: &str = "track-a";

/// Resolves, downloads and analyzes to valence 0.6, arousal -0.2
pub const TRACK_B_ID: &str = "track-b";

/// Resolves and downloads, but descriptor extraction fails
pub const BROKEN_AUDIO_TRACK_ID: &str = "track-broken-audio";

/// Resolves, but no audio can be found for it
pub const NO_AUDIO_TRACK_ID: &str = "track-no-audio";

/// Not known to the metadata resolver
pub const UNKNOWN_TRACK_ID: &str = "track-unknown";

// ============================================================================
// Test Affect Values
// ============================================================================

pub const TRACK_A_AFFECT: (f64, f64) = (0.2, 0.4);
pub const TRACK_B_AFFECT: (f64, f64) = (0.6, -0.2);

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// HTTP request timeout (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Simulated duration of a download in the fake acquirer (milliseconds)
pub const FAKE_DOWNLOAD_DELAY_MS: u64 = 50;
