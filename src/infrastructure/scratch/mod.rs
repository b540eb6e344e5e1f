use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Per-run scratch directory holding the synthesized segment clips.
///
/// Each pipeline run gets its own subdirectory so concurrent runs sharing a
/// scratch root never see each other's files. Everything inside is removed by
/// [`ScratchSpace::cleanup`], or on drop if the run is abandoned.
pub struct ScratchSpace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh run directory under `root`, creating `root` if needed
    pub fn create_in(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("podcast-run-").tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// [`ScratchSpace::create_in`] run on the blocking pool
    pub async fn create(root: PathBuf) -> io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::create_in(&root))
            .await
            .map_err(io::Error::other)?
    }

    /// [`ScratchSpace::cleanup`] run on the blocking pool
    pub async fn remove(mut self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.cleanup()).await {
            tracing::warn!(error = %e, "Scratch cleanup task failed");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clip file for a segment; zero-padded so names sort in segment order
    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("podcast_segment_{index:04}.wav"))
    }

    /// Remove the run directory and every clip in it. Failures are logged, not returned.
    pub fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        let file_count = fs::read_dir(dir.path()).map(|entries| entries.count()).unwrap_or(0);
        match dir.close() {
            Ok(()) => tracing::debug!(
                path = %self.path.display(),
                removed_files = file_count,
                "Scratch space cleaned up"
            ),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to clean up scratch space"
            ),
        }
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
