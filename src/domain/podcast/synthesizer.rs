use crate::infrastructure::repositories::{TtsError, TtsRepository};
use crate::infrastructure::scratch::ScratchSpace;
use futures::{stream, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::Instant;

/// Synthesize every segment with at most `max_in_flight` requests running at once.
///
/// Clips are written into `scratch` and returned in segment order regardless
/// of completion order. The first failure aborts the batch: requests still in
/// flight are dropped and their files are left for the scratch cleanup.
pub async fn synthesize_all(
    repo: &dyn TtsRepository,
    segments: &[String],
    scratch: &ScratchSpace,
    max_in_flight: usize,
) -> Result<Vec<PathBuf>, TtsError> {
    let start_time = Instant::now();
    tracing::info!(
        segment_count = segments.len(),
        max_in_flight,
        "Synthesizing podcast segments"
    );

    // Segment text is owned by each future; they must not borrow from the iterator
    let mut clips: Vec<(usize, PathBuf)> = stream::iter(segments.iter().cloned().enumerate())
        .map(|(index, text)| {
            let dest = scratch.clip_path(index);
            async move {
                match repo.synthesize_segment(&text, &dest).await {
                    Ok(clip) => {
                        tracing::debug!(index, clip = %clip.display(), "Segment synthesized");
                        Ok((index, clip))
                    }
                    Err(e) => {
                        tracing::error!(index, error = %e, "Segment synthesis failed");
                        Err(e)
                    }
                }
            }
        })
        .buffer_unordered(max_in_flight.max(1))
        .try_collect()
        .await?;

    clips.sort_unstable_by_key(|(index, _)| *index);

    tracing::info!(
        segment_count = clips.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "All segments synthesized"
    );

    Ok(clips.into_iter().map(|(_, clip)| clip).collect())
}
