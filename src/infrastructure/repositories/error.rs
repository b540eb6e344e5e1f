use crate::infrastructure::retry::{Classify, RetryClass, RetryError};

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("TTS API key is not configured (DASHSCOPE_API_KEY)")]
    MissingApiKey,

    #[error("segment weighted length {length} exceeds limit {max}")]
    SegmentTooLong { length: usize, max: usize },

    #[error("TTS service rate limited: {0}")]
    RateLimited(String),

    #[error("TTS request timed out")]
    Timeout,

    #[error("TTS connection failed: {0}")]
    Connection(String),

    #[error("TTS service error: {0}")]
    Service(String),

    #[error("TTS service returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("audio download failed: {0}")]
    Download(String),

    #[error("failed to store audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TTS request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<TtsError>,
    },
}

impl Classify for TtsError {
    fn retry_class(&self) -> RetryClass {
        match self {
            TtsError::RateLimited(_) => RetryClass::RateLimited,
            TtsError::Timeout | TtsError::Connection(_) => RetryClass::Transient,
            _ => RetryClass::Fatal,
        }
    }
}

impl From<RetryError<TtsError>> for TtsError {
    fn from(err: RetryError<TtsError>) -> Self {
        match err {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => TtsError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            },
        }
    }
}
