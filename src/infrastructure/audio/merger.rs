use super::decode::{decode_file, AudioTrack};
use super::encode::{encode, OutputFormat, FFMPEG_PROGRAM};
use super::error::MergeError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Merge ordered clips into one file at `output`, with `gap` of silence between clips.
///
/// A single clip is copied as-is. Otherwise every clip is decoded, checked to
/// share the first clip's sample rate and channel count, concatenated with
/// silence, and encoded according to the output extension.
///
/// The result is staged next to `output` and renamed into place only once it
/// is complete, so a failed merge never leaves a partial file there.
pub fn merge_audio_clips(clips: &[PathBuf], output: &Path, gap: Duration) -> Result<PathBuf, MergeError> {
    merge_with_encoder(clips, output, gap, FFMPEG_PROGRAM)
}

fn merge_with_encoder(
    clips: &[PathBuf],
    output: &Path,
    gap: Duration,
    ffmpeg: &str,
) -> Result<PathBuf, MergeError> {
    if clips.is_empty() {
        return Err(MergeError::NoClips);
    }

    let format = OutputFormat::from_path(output);
    let staging = staging_file(output, &format)?;

    if let [clip] = clips {
        std::fs::copy(clip, staging.path())?;
        tracing::debug!(clip = %clip.display(), "Single clip copied without re-encoding");
    } else {
        let tracks = clips
            .iter()
            .map(|clip| decode_file(clip))
            .collect::<Result<Vec<_>, _>>()?;
        let combined = concat_with_gaps(&tracks, gap)?;

        tracing::info!(
            clip_count = tracks.len(),
            sample_rate = combined.sample_rate,
            channels = combined.channels,
            duration_secs = format!("{:.2}", combined.duration_secs()),
            "Encoding merged podcast audio"
        );
        encode(&combined, staging.path(), &format, ffmpeg)?;
    }

    staging.persist(output).map_err(|e| MergeError::Io(e.error))?;
    Ok(output.to_path_buf())
}

/// Concatenate decoded clips as `clip0 + silence + clip1 + ... + clipN`.
///
/// All clips must share the first clip's sample rate and channel count.
pub fn concat_with_gaps(tracks: &[AudioTrack], gap: Duration) -> Result<AudioTrack, MergeError> {
    let first = tracks.first().ok_or(MergeError::NoClips)?;
    let sample_rate = first.sample_rate;
    let channels = first.channels;

    for (index, track) in tracks.iter().enumerate() {
        if track.sample_rate != sample_rate || track.channels != channels {
            return Err(MergeError::FormatMismatch {
                index,
                expected_rate: sample_rate,
                expected_channels: channels,
                found_rate: track.sample_rate,
                found_channels: track.channels,
            });
        }
    }

    let silence_frames = (u128::from(sample_rate) * gap.as_millis() / 1000) as usize;
    let silence = vec![0.0f32; silence_frames * usize::from(channels)];

    let total: usize = tracks.iter().map(|t| t.samples.len()).sum::<usize>()
        + silence.len() * (tracks.len() - 1);
    let mut samples = Vec::with_capacity(total);

    for (index, track) in tracks.iter().enumerate() {
        if index > 0 {
            samples.extend_from_slice(&silence);
        }
        samples.extend_from_slice(&track.samples);
    }

    Ok(AudioTrack {
        samples,
        sample_rate,
        channels,
    })
}

/// Temporary file beside `output`, keeping its extension so encoders can infer the container
fn staging_file(output: &Path, format: &OutputFormat) -> Result<NamedTempFile, MergeError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let suffix = format!(".{}", format.extension());

    Ok(tempfile::Builder::new()
        .prefix(".podcast-merge-")
        .suffix(&suffix)
        .tempfile_in(dir)?)
}
