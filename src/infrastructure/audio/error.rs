#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("no audio clips to merge")]
    NoClips,

    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error(
        "clip {index} is {found_rate} Hz / {found_channels} ch but the track is {expected_rate} Hz / {expected_channels} ch"
    )]
    FormatMismatch {
        index: usize,
        expected_rate: u32,
        expected_channels: u16,
        found_rate: u32,
        found_channels: u16,
    },

    #[error("failed to encode audio: {0}")]
    Encode(String),

    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("merge task failed: {0}")]
    Task(String),
}

impl From<hound::Error> for MergeError {
    fn from(err: hound::Error) -> Self {
        MergeError::Encode(err.to_string())
    }
}
