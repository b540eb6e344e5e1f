use super::decode::AudioTrack;
use super::error::MergeError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Container/codec of the merged file, chosen from the output extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// 16-bit PCM WAV written in-process
    Wav,
    /// MP3 encoded by ffmpeg with libmp3lame
    Mp3,
    /// Anything else ffmpeg can infer from the extension
    Other(String),
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "wav" => OutputFormat::Wav,
            "mp3" => OutputFormat::Mp3,
            _ => OutputFormat::Other(ext),
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Other(ext) => ext,
        }
    }
}

/// Program used for every non-WAV output
pub const FFMPEG_PROGRAM: &str = "ffmpeg";

/// Whether `program` runs and reports a version
pub fn ffmpeg_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Write `track` to `path` in the given format, running `ffmpeg` for non-WAV output
pub fn encode(track: &AudioTrack, path: &Path, format: &OutputFormat, ffmpeg: &str) -> Result<(), MergeError> {
    match format {
        OutputFormat::Wav => write_wav(track, path),
        OutputFormat::Mp3 | OutputFormat::Other(_) => encode_with_ffmpeg(ffmpeg, track, path, format),
    }
}

pub fn write_wav(track: &AudioTrack, path: &Path) -> Result<(), MergeError> {
    let spec = hound::WavSpec {
        channels: track.channels,
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &track.samples {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Command line converting the WAV at `input` into `output`
fn ffmpeg_args(input: &Path, output: &Path, format: &OutputFormat) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());
    if *format == OutputFormat::Mp3 {
        args.extend(["-codec:a", "libmp3lame", "-q:a", "2"].map(OsString::from));
    }
    args.push(output.as_os_str().to_os_string());
    args
}

/// Hand a temporary WAV to ffmpeg and let it produce the target container
fn encode_with_ffmpeg(
    program: &str,
    track: &AudioTrack,
    path: &Path,
    format: &OutputFormat,
) -> Result<(), MergeError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let pcm = tempfile::Builder::new()
        .prefix(".podcast-pcm-")
        .suffix(".wav")
        .tempfile_in(dir)?;
    write_wav(track, pcm.path())?;

    let mut command = Command::new(program);
    command.args(ffmpeg_args(pcm.path(), path, format));

    tracing::debug!(command = ?command, "Running ffmpeg");
    let output = command
        .output()
        .map_err(|e| MergeError::Encode(format!("failed to run {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MergeError::Encode(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}
