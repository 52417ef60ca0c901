//! Audio acquisition through the yt-dlp executable.

use super::{AcquisitionError, AudioAcquirer, AudioAsset};
use crate::metadata::TrackMetadata;
use crate::tool_runner::{run_to_completion, ToolRunError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_STEM_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct YtDlpSettings {
    /// Path or name of the yt-dlp executable.
    pub executable: String,
    /// Directory temporary downloads are written to.
    pub temp_dir: PathBuf,
    /// Container/codec the download is extracted to, e.g. "mp3".
    pub audio_format: String,
    /// Target audio quality in kbps.
    pub audio_quality: u32,
    /// Appended to "{artist} {title}" when searching.
    pub search_suffix: String,
    pub timeout_sec: u64,
}

impl Default for YtDlpSettings {
    fn default() -> Self {
        Self {
            executable: "yt-dlp".to_string(),
            temp_dir: std::env::temp_dir().join("temp_audio"),
            audio_format: "mp3".to_string(),
            audio_quality: 192,
            search_suffix: "audio".to_string(),
            timeout_sec: 300,
        }
    }
}

pub struct YtDlpAcquirer {
    settings: YtDlpSettings,
}

/// Keeps characters that are safe in a file name on every platform.
fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_STEM_CHARS).collect()
}

/// `"{artist} - {title}"` plus a per-call unique suffix.
fn unique_file_stem(metadata: &TrackMetadata) -> String {
    format!(
        "{}-{}",
        sanitize_file_stem(&format!("{} - {}", metadata.artist, metadata.title)),
        Uuid::new_v4().simple()
    )
}

fn search_query(metadata: &TrackMetadata, suffix: &str) -> String {
    let query = format!("{} {}", metadata.artist, metadata.title);
    if suffix.is_empty() {
        query
    } else {
        format!("{} {}", query, suffix)
    }
}

impl YtDlpAcquirer {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }

    fn build_command(&self, query: &str, output_template: &Path) -> Command {
        let audio_quality = format!("{}K", self.settings.audio_quality);
        let mut command = Command::new(&self.settings.executable);
        command
            .args([
                "--quiet",
                "--no-warnings",
                "--no-playlist",
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                self.settings.audio_format.as_str(),
                "--audio-quality",
                audio_quality.as_str(),
                "--output",
            ])
            .arg(output_template)
            .arg(format!("ytsearch1:{}", query));
        command
    }

    async fn run_download(&self, query: &str, output_template: &Path) -> Result<(), AcquisitionError> {
        let timeout_sec = self.settings.timeout_sec;
        let output = run_to_completion(
            self.build_command(query, output_template),
            Duration::from_secs(timeout_sec),
        )
        .await
        .map_err(|e| match e {
            ToolRunError::Timeout => AcquisitionError::Timeout(timeout_sec),
            ToolRunError::Io(e) => AcquisitionError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquisitionError::DownloadFailed(stderr.trim().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioAcquirer for YtDlpAcquirer {
    async fn acquire(&self, metadata: &TrackMetadata) -> Result<AudioAsset, AcquisitionError> {
        tokio::fs::create_dir_all(&self.settings.temp_dir).await?;

        // Everything yt-dlp writes (partial downloads, pre-conversion
        // streams) lands in this directory, removed on drop even when this
        // future is cancelled.
        let download_dir = tempfile::Builder::new()
            .prefix("download-")
            .tempdir_in(&self.settings.temp_dir)?;

        let stem = unique_file_stem(metadata);
        let output_template = download_dir.path().join(format!("{}.%(ext)s", stem));
        let expected_path = download_dir
            .path()
            .join(format!("{}.{}", stem, self.settings.audio_format));

        let query = search_query(metadata, &self.settings.search_suffix);
        info!("Downloading audio for '{}'", query);
        self.run_download(&query, &output_template).await?;

        if !expected_path.exists() {
            // yt-dlp exits successfully when the search has no results.
            let mut entries = tokio::fs::read_dir(download_dir.path()).await?;
            if entries.next_entry().await?.is_none() {
                warn!("No search result for '{}'", query);
                return Err(AcquisitionError::NoMatch(query));
            }
            return Err(AcquisitionError::NoOutput(format!(
                "{} (query '{}')",
                expected_path.display(),
                query
            )));
        }

        debug!("Audio downloaded to {:?}", expected_path);
        Ok(AudioAsset::in_dir(download_dir, expected_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata() -> TrackMetadata {
        TrackMetadata {
            artist: "AC/DC".to_string(),
            title: "Back In Black (Remastered)".to_string(),
        }
    }

    #[cfg(unix)]
    /// Shell prelude for fake downloaders: `$base` is the output template
    /// without its `.%(ext)s` suffix.
    const FAKE_PRELUDE: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; fi
  shift
done
base="${out%.*}"
"#;

    /// Writes an executable fake yt-dlp running `body` after the prelude.
    #[cfg(unix)]
    fn fake_downloader(tools_dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = tools_dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("{}{}\n", FAKE_PRELUDE, body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    fn acquirer_with(executable: String, temp_dir: &Path, timeout_sec: u64) -> YtDlpAcquirer {
        YtDlpAcquirer::new(YtDlpSettings {
            executable,
            temp_dir: temp_dir.to_path_buf(),
            timeout_sec,
            ..YtDlpSettings::default()
        })
    }

    fn entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(
            sanitize_file_stem("AC/DC - Back In Black (Remastered)"),
            "ACDC - Back In Black Remastered"
        );
        assert_eq!(sanitize_file_stem("  a \t b  "), "a b");
        assert_eq!(sanitize_file_stem(&"x".repeat(200)).len(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_file_stems_are_unique_per_call() {
        let first = unique_file_stem(&metadata());
        let second = unique_file_stem(&metadata());
        assert_ne!(first, second);
        assert!(first.starts_with("ACDC - Back In Black Remastered-"));
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query(&metadata(), "audio"),
            "AC/DC Back In Black (Remastered) audio"
        );
        assert_eq!(
            search_query(&metadata(), ""),
            "AC/DC Back In Black (Remastered)"
        );
    }

    #[tokio::test]
    async fn test_missing_executable_fails_and_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let acquirer = YtDlpAcquirer::new(YtDlpSettings {
            executable: "definitely-not-a-real-yt-dlp-binary".to_string(),
            temp_dir: temp_dir.path().to_path_buf(),
            ..YtDlpSettings::default()
        });

        let result = acquirer.acquire(&metadata()).await;
        assert!(matches!(result, Err(AcquisitionError::Io(_))));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_download_is_owned_by_asset() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(
            tools_dir.path(),
            r#"echo partial > "$base.webm"; echo audio > "$base.mp3""#,
        );
        let acquirer = acquirer_with(executable, audio_dir.path(), 10);

        let asset = acquirer.acquire(&metadata()).await.unwrap();
        assert!(asset.path().exists());
        assert_eq!(asset.path().extension().unwrap(), "mp3");
        assert!(asset.path().starts_with(audio_dir.path()));

        drop(asset);
        assert!(entries(audio_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_search_is_no_match() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(tools_dir.path(), "exit 0");
        let acquirer = acquirer_with(executable, audio_dir.path(), 10);

        let result = acquirer.acquire(&metadata()).await;
        assert!(matches!(result, Err(AcquisitionError::NoMatch(_))));
        assert!(entries(audio_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unexpected_output_is_no_output() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(tools_dir.path(), r#"echo audio > "$base.opus""#);
        let acquirer = acquirer_with(executable, audio_dir.path(), 10);

        let result = acquirer.acquire(&metadata()).await;
        assert!(matches!(result, Err(AcquisitionError::NoOutput(_))));
        assert!(entries(audio_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_downloader_reports_stderr() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(
            tools_dir.path(),
            r#"echo partial > "$base.webm.part"; echo "ERROR: video unavailable" >&2; exit 1"#,
        );
        let acquirer = acquirer_with(executable, audio_dir.path(), 10);

        let result = acquirer.acquire(&metadata()).await;
        match result {
            Err(AcquisitionError::DownloadFailed(message)) => {
                assert!(message.contains("video unavailable"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(entries(audio_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_download_leaves_no_partial_files() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(
            tools_dir.path(),
            r#"echo partial > "$base.webm.part"; sleep 30"#,
        );
        let acquirer = acquirer_with(executable, audio_dir.path(), 60);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(800), acquirer.acquire(&metadata())).await;
        assert!(cancelled.is_err());

        assert!(entries(audio_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_stops_post_processing_helpers() {
        let tools_dir = TempDir::new().unwrap();
        let audio_dir = TempDir::new().unwrap();
        let executable = fake_downloader(
            tools_dir.path(),
            r#"(sleep 2; echo audio > "$base.temp.mp3") & sleep 30"#,
        );
        let acquirer = acquirer_with(executable, audio_dir.path(), 1);

        let result = acquirer.acquire(&metadata()).await;
        assert!(matches!(result, Err(AcquisitionError::Timeout(1))));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(entries(audio_dir.path()).is_empty());
    }
}
