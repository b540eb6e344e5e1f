use crate::domain::podcast::PodcastSettings;
use crate::infrastructure::repositories::dashscope_tts_repository::{
    DashScopeSettings, DEFAULT_MAX_WEIGHTED_CHARS, DEFAULT_TTS_API_URL, DEFAULT_TTS_MODEL,
    DEFAULT_TTS_VOICE,
};
use crate::infrastructure::retry::RetryPolicy;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // DashScope TTS
    pub dashscope_api_key: String,
    pub tts_api_url: String,
    pub tts_voice: String,
    pub tts_model: String,
    pub tts_max_chars: usize,
    pub tts_request_timeout_secs: u64,
    pub tts_download_timeout_secs: u64,
    // Retry
    pub tts_max_retries: u32,
    pub tts_rate_limit_delay_secs: u64,
    pub tts_transient_delay_secs: u64,
    // Account-wide quota
    pub tts_quota_requests: u32,
    pub tts_quota_window_secs: u64,
    // Pipeline
    pub tts_max_concurrency: usize,
    pub podcast_gap_ms: u64,
    pub temp_dir: PathBuf,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            dashscope_api_key: env::var("DASHSCOPE_API_KEY").unwrap_or_default(),
            tts_api_url: env::var("TTS_API_URL").unwrap_or_else(|_| DEFAULT_TTS_API_URL.to_string()),
            tts_voice: env::var("TTS_VOICE").unwrap_or_else(|_| DEFAULT_TTS_VOICE.to_string()),
            tts_model: env::var("TTS_MODEL").unwrap_or_else(|_| DEFAULT_TTS_MODEL.to_string()),
            tts_max_chars: parse_var("TTS_MAX_CHARS", DEFAULT_MAX_WEIGHTED_CHARS)?,
            tts_request_timeout_secs: parse_var("TTS_REQUEST_TIMEOUT_SECS", 60)?,
            tts_download_timeout_secs: parse_var("TTS_DOWNLOAD_TIMEOUT_SECS", 30)?,
            tts_max_retries: parse_var("TTS_MAX_RETRIES", 5)?,
            tts_rate_limit_delay_secs: parse_var("TTS_RATE_LIMIT_DELAY_SECS", 30)?,
            tts_transient_delay_secs: parse_var("TTS_TRANSIENT_DELAY_SECS", 1)?,
            tts_quota_requests: parse_var("TTS_QUOTA_REQUESTS", 180)?,
            tts_quota_window_secs: parse_var("TTS_QUOTA_WINDOW_SECS", 60)?,
            tts_max_concurrency: parse_var("TTS_MAX_CONCURRENCY", 10)?,
            podcast_gap_ms: parse_var("PODCAST_GAP_MS", 500)?,
            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/v2t")),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break pipeline invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.tts_max_chars < 2 {
            return Err("TTS_MAX_CHARS must be at least 2".to_string());
        }
        if self.tts_max_retries == 0 {
            return Err("TTS_MAX_RETRIES must be at least 1".to_string());
        }
        if self.tts_quota_requests == 0 || self.tts_quota_window_secs == 0 {
            return Err("TTS_QUOTA_REQUESTS and TTS_QUOTA_WINDOW_SECS must be > 0".to_string());
        }
        if self.tts_max_concurrency == 0 {
            return Err("TTS_MAX_CONCURRENCY must be > 0".to_string());
        }
        Ok(())
    }

    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.tts_quota_window_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.tts_max_retries,
            transient_delay: Duration::from_secs(self.tts_transient_delay_secs),
            rate_limit_delay: Duration::from_secs(self.tts_rate_limit_delay_secs),
        }
    }

    pub fn tts_settings(&self) -> DashScopeSettings {
        DashScopeSettings {
            api_url: self.tts_api_url.clone(),
            api_key: self.dashscope_api_key.clone(),
            voice: self.tts_voice.clone(),
            model: self.tts_model.clone(),
            max_weighted_chars: self.tts_max_chars,
            request_timeout: Duration::from_secs(self.tts_request_timeout_secs),
            download_timeout: Duration::from_secs(self.tts_download_timeout_secs),
            retry: self.retry_policy(),
        }
    }

    pub fn podcast_settings(&self) -> PodcastSettings {
        PodcastSettings {
            max_weighted_chars: self.tts_max_chars,
            max_concurrency: self.tts_max_concurrency,
            gap: Duration::from_millis(self.podcast_gap_ms),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("invalid {name}={value:?}: {e}")),
        Err(_) => Ok(default),
    }
}
