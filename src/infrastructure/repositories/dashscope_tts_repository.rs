use super::error::TtsError;
use super::tts_repository::TtsRepository;
use crate::domain::segment::weighted_len;
use crate::infrastructure::ratelimit::QuotaLimiter;
use crate::infrastructure::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_TTS_API_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";
pub const DEFAULT_TTS_VOICE: &str = "Maia";
pub const DEFAULT_TTS_MODEL: &str = "qwen3-tts-flash";

/// DashScope counts non-ASCII characters double; 600 is about 300 CJK characters
pub const DEFAULT_MAX_WEIGHTED_CHARS: usize = 600;

/// Text synthesized by the availability check
const CHECK_TEXT: &str = "你好";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DashScopeSettings {
    pub api_url: String,
    pub api_key: String,
    pub voice: String,
    pub model: String,
    pub max_weighted_chars: usize,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for DashScopeSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TTS_API_URL.to_string(),
            api_key: String::new(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            model: DEFAULT_TTS_MODEL.to_string(),
            max_weighted_chars: DEFAULT_MAX_WEIGHTED_CHARS,
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: SpeechInput<'a>,
}

#[derive(Debug, Serialize)]
struct SpeechInput<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    output: Option<SpeechOutput>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechOutput {
    audio: Option<SpeechAudio>,
}

#[derive(Debug, Deserialize)]
struct SpeechAudio {
    url: Option<String>,
}

/// DashScope (Alibaba Cloud Bailian) TTS implementation of TTS repository.
///
/// Every attempt takes a token from the shared [`QuotaLimiter`] before it is
/// sent. Rate-limit responses and transport failures are retried per
/// [`RetryPolicy`]; everything else fails immediately.
pub struct DashScopeTtsRepository {
    client: Client,
    limiter: Arc<QuotaLimiter>,
    settings: DashScopeSettings,
}

impl DashScopeTtsRepository {
    pub fn new(settings: DashScopeSettings, limiter: Arc<QuotaLimiter>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_nodelay(true)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()?;

        Ok(Self {
            client,
            limiter,
            settings,
        })
    }

    pub fn settings(&self) -> &DashScopeSettings {
        &self.settings
    }

    /// Synthesize `text` and return the URL of the generated audio
    pub async fn synthesize(&self, text: &str, voice: &str, model: &str) -> Result<String, TtsError> {
        self.synthesize_with_policy(text, voice, model, &self.settings.retry)
            .await
    }

    async fn synthesize_with_policy(
        &self,
        text: &str,
        voice: &str,
        model: &str,
        policy: &RetryPolicy,
    ) -> Result<String, TtsError> {
        if self.settings.api_key.is_empty() {
            return Err(TtsError::MissingApiKey);
        }

        let start_time = Instant::now();
        let url = with_retry(policy, "tts_synthesize", |attempt| {
            self.request_speech(text, voice, model, attempt)
        })
        .await?;

        tracing::debug!(
            provider = "dashscope",
            latency_ms = start_time.elapsed().as_millis() as u64,
            weighted_len = weighted_len(text),
            "TTS synthesis completed"
        );

        Ok(url)
    }

    /// One synthesis attempt. Takes a quota token first; never sleeps afterwards.
    async fn request_speech(
        &self,
        text: &str,
        voice: &str,
        model: &str,
        attempt: u32,
    ) -> Result<String, TtsError> {
        self.limiter.acquire().await;

        tracing::debug!(
            attempt,
            voice,
            model,
            text_preview = %text.chars().take(30).collect::<String>(),
            "Calling DashScope TTS"
        );

        let payload = SpeechRequest {
            model,
            input: SpeechInput { text, voice },
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TtsError::RateLimited(format!("HTTP 429: {}", preview(&body))));
        }

        let parsed: SpeechResponse = serde_json::from_str(&body).map_err(|_| {
            TtsError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), preview(&body)))
        })?;

        if let Some(url) = parsed
            .output
            .and_then(|output| output.audio)
            .and_then(|audio| audio.url)
        {
            return Ok(url);
        }

        let message = parsed.message.unwrap_or_else(|| preview(&body));
        if message.to_lowercase().contains("rate limit") {
            return Err(TtsError::RateLimited(message));
        }

        tracing::error!(
            status = status.as_u16(),
            message = %message,
            "DashScope TTS rejected the request"
        );
        Err(TtsError::Service(message))
    }

    /// Fetch a synthesized audio asset to `dest`
    pub async fn download_audio(&self, url: &str, dest: &Path) -> Result<PathBuf, TtsError> {
        let response = self
            .client
            .get(url)
            .timeout(self.settings.download_timeout)
            .send()
            .await
            .map_err(download_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TtsError::Download(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(download_error)?;
        tokio::fs::write(dest, &bytes).await?;

        tracing::debug!(
            path = %dest.display(),
            audio_size_bytes = bytes.len(),
            "Audio downloaded"
        );

        Ok(dest.to_path_buf())
    }

    /// Check that the TTS API is reachable and the key is accepted.
    /// Makes one real synthesis call without retries.
    pub async fn check_availability(&self) -> Result<(), TtsError> {
        let policy = self.settings.retry.single_attempt();
        self.synthesize_with_policy(CHECK_TEXT, &self.settings.voice, &self.settings.model, &policy)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl TtsRepository for DashScopeTtsRepository {
    async fn synthesize_segment(&self, text: &str, dest: &Path) -> Result<PathBuf, TtsError> {
        let length = weighted_len(text);
        if length > self.settings.max_weighted_chars {
            return Err(TtsError::SegmentTooLong {
                length,
                max: self.settings.max_weighted_chars,
            });
        }

        let audio_url = self
            .synthesize(text, &self.settings.voice, &self.settings.model)
            .await?;
        self.download_audio(&audio_url, dest).await
    }
}

fn transport_error(err: reqwest::Error) -> TtsError {
    if err.is_timeout() {
        TtsError::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        TtsError::Connection(err.to_string())
    } else {
        TtsError::Service(err.to_string())
    }
}

fn download_error(err: reqwest::Error) -> TtsError {
    if err.is_timeout() {
        TtsError::Download("timed out".to_string())
    } else {
        TtsError::Download(err.to_string())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
