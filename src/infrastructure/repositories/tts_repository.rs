use super::error::TtsError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Repository for per-segment TTS synthesis.
/// Abstracts the underlying TTS provider.
///
/// Implementations are responsible for:
/// - Rejecting text over the provider's per-request weighted length
/// - Respecting the shared request quota and retrying transient failures
/// - Storing the synthesized audio at the requested path
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one segment and write its audio to `dest`
    ///
    /// # Arguments
    /// * `text` - A segment already split to fit the provider limit
    /// * `dest` - Where the audio clip is written
    ///
    /// # Errors
    /// Returns error if the segment is too long, synthesis fails after retries,
    /// or the audio cannot be downloaded
    async fn synthesize_segment(&self, text: &str, dest: &Path) -> Result<PathBuf, TtsError>;
}
