use super::synthesizer::synthesize_all;
use crate::domain::script::parse_segments;
use crate::domain::segment::safe_segments;
use crate::error::PodcastError;
use crate::infrastructure::audio::merge_audio_clips_blocking;
use crate::infrastructure::repositories::dashscope_tts_repository::DEFAULT_MAX_WEIGHTED_CHARS;
use crate::infrastructure::repositories::TtsRepository;
use crate::infrastructure::scratch::ScratchSpace;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PodcastSettings {
    pub max_weighted_chars: usize,
    pub max_concurrency: usize,
    /// Silence inserted between consecutive clips
    pub gap: Duration,
}

impl Default for PodcastSettings {
    fn default() -> Self {
        Self {
            max_weighted_chars: DEFAULT_MAX_WEIGHTED_CHARS,
            max_concurrency: 10,
            gap: Duration::from_millis(500),
        }
    }
}

pub struct PodcastService {
    tts_repo: Arc<dyn TtsRepository>,
    settings: PodcastSettings,
}

impl PodcastService {
    pub fn new(tts_repo: Arc<dyn TtsRepository>, settings: PodcastSettings) -> Self {
        Self { tts_repo, settings }
    }

    async fn render(
        &self,
        segments: &[String],
        scratch: &ScratchSpace,
        output: &Path,
    ) -> Result<PathBuf, PodcastError> {
        let clips = synthesize_all(
            self.tts_repo.as_ref(),
            segments,
            scratch,
            self.settings.max_concurrency,
        )
        .await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let merged = merge_audio_clips_blocking(clips, output.to_path_buf(), self.settings.gap).await?;
        Ok(merged)
    }
}

#[async_trait]
pub trait PodcastServiceApi: Send + Sync {
    /// Turn a podcast script into a single audio file
    ///
    /// This operation:
    /// - Parses the script into ordered segments
    /// - Splits segments to fit the TTS per-request limit
    /// - Synthesizes all segments concurrently under the shared quota
    /// - Merges the clips with silence between them into `output`
    ///
    /// Clips live in a per-run directory under `scratch_dir` (the output's
    /// directory when `None`), which is removed whether the run succeeds or not.
    async fn generate_podcast_audio(
        &self,
        script: &str,
        output: &Path,
        scratch_dir: Option<&Path>,
    ) -> Result<PathBuf, PodcastError>;
}

#[async_trait]
impl PodcastServiceApi for PodcastService {
    async fn generate_podcast_audio(
        &self,
        script: &str,
        output: &Path,
        scratch_dir: Option<&Path>,
    ) -> Result<PathBuf, PodcastError> {
        if script.trim().is_empty() {
            return Err(PodcastError::EmptyScript);
        }

        let start_time = Instant::now();
        let raw_segments = parse_segments(script)?;
        let segments = safe_segments(&raw_segments, self.settings.max_weighted_chars);
        if segments.is_empty() {
            return Err(PodcastError::EmptyScript);
        }

        tracing::info!(
            script_segments = raw_segments.len(),
            tts_segments = segments.len(),
            output = %output.display(),
            "Generating podcast audio"
        );

        let scratch_root = match scratch_dir {
            Some(dir) => dir.to_path_buf(),
            None => output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let scratch = ScratchSpace::create(scratch_root)
            .await
            .map_err(PodcastError::Scratch)?;

        let result = self.render(&segments, &scratch, output).await;
        scratch.remove().await;

        match &result {
            Ok(path) => tracing::info!(
                output = %path.display(),
                segment_count = segments.len(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Podcast audio generated"
            ),
            Err(e) => tracing::error!(
                stage = ?e.stage(),
                error = %e,
                "Podcast audio generation failed"
            ),
        }

        result
    }
}
