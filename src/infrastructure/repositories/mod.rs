pub mod dashscope_tts_repository;
pub mod error;
pub mod tts_repository;

pub use dashscope_tts_repository::{DashScopeSettings, DashScopeTtsRepository};
pub use error::TtsError;
pub use tts_repository::TtsRepository;
