pub mod decode;
pub mod encode;
pub mod error;
pub mod merger;

pub use decode::{decode_file, AudioTrack};
pub use encode::{ffmpeg_available, OutputFormat, FFMPEG_PROGRAM};
pub use error::MergeError;
pub use merger::{concat_with_gaps, merge_audio_clips};

use std::path::PathBuf;
use std::time::Duration;

/// Run [`merge_audio_clips`] on the blocking pool so decoding and encoding
/// do not stall the async workers driving network I/O.
pub async fn merge_audio_clips_blocking(
    clips: Vec<PathBuf>,
    output: PathBuf,
    gap: Duration,
) -> Result<PathBuf, MergeError> {
    tokio::task::spawn_blocking(move || merge_audio_clips(&clips, &output, gap))
        .await
        .map_err(|e| MergeError::Task(e.to_string()))?
}
