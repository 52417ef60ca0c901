use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A downloaded audio file owned by a single analysis attempt.
///
/// The file is removed when the asset is dropped, whichever way the attempt
/// ends. An asset created with [`AudioAsset::in_dir`] removes its whole
/// download directory instead, including any intermediate files.
#[derive(Debug)]
pub struct AudioAsset {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl AudioAsset {
    /// Take ownership of the file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path, dir: None }
    }

    /// Take ownership of `dir` and of the audio file at `path` inside it.
    pub fn in_dir(dir: TempDir, path: PathBuf) -> Self {
        Self {
            path,
            dir: Some(dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AudioAsset {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Cleaned up download directory {:?}", dir_path),
                Err(e) => warn!("Failed to remove download directory {:?}: {}", dir_path, e),
            }
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Cleaned up temporary audio file {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temporary audio file {:?}: {}", self.path, e),
        }
    }
}
