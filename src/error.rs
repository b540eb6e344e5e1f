use crate::domain::script::ScriptError;
use crate::infrastructure::audio::MergeError;
use crate::infrastructure::repositories::TtsError;

/// Failure of a podcast audio generation run
#[derive(Debug, thiserror::Error)]
pub enum PodcastError {
    #[error("podcast script is empty")]
    EmptyScript,

    #[error("invalid podcast script: {0}")]
    ScriptFormat(String),

    #[error("segment weighted length {length} exceeds limit {max}")]
    SegmentTooLong { length: usize, max: usize },

    #[error("failed to prepare scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("voice synthesis failed: {0}")]
    Tts(TtsError),

    #[error("audio merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stage a failure is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Script,
    Synthesis,
    Assembly,
}

impl PodcastError {
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::EmptyScript | Self::ScriptFormat(_) => FailureStage::Script,
            Self::Scratch(_) | Self::SegmentTooLong { .. } | Self::Tts(_) => FailureStage::Synthesis,
            Self::Merge(_) | Self::Io(_) => FailureStage::Assembly,
        }
    }

    /// Short message suitable for end users; details stay in the logs
    pub fn user_message(&self) -> &'static str {
        match self.stage() {
            FailureStage::Script => "script generation failed",
            FailureStage::Synthesis => "voice synthesis failed",
            FailureStage::Assembly => "audio assembly failed",
        }
    }
}

impl From<ScriptError> for PodcastError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Empty => PodcastError::EmptyScript,
            ScriptError::Format { .. } => PodcastError::ScriptFormat(err.to_string()),
        }
    }
}

impl From<TtsError> for PodcastError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::SegmentTooLong { length, max } => PodcastError::SegmentTooLong { length, max },
            other => PodcastError::Tts(other),
        }
    }
}

pub type PodcastResult<T> = Result<T, PodcastError>;
