use crate::e2e::helpers;

use helpers::{mount_audio, repository, speech_success, test_settings, wav_bytes, AUDIO_PATH, TTS_PATH};
use podcast_tts::infrastructure::ratelimit::QuotaLimiter;
use podcast_tts::infrastructure::repositories::{
    DashScopeSettings, DashScopeTtsRepository, TtsError, TtsRepository,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn it_should_synthesize_and_download_a_segment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "qwen3-tts-flash",
            "input": { "text": "大家好，欢迎收听。", "voice": "Maia" }
        })))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;
    let audio = wav_bytes(2400, 1000);
    mount_audio(&server, audio.clone()).await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("podcast_segment_0000.wav");
    let repo = repository(test_settings(&server));

    let clip = repo.synthesize_segment("大家好，欢迎收听。", &dest).await.unwrap();

    assert_eq!(clip, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), audio);
}

#[tokio::test]
async fn it_should_give_up_after_max_attempts_when_always_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "code": "Throttling.RateQuota",
            "message": "Requests rate limit exceeded"
        })))
        .expect(3)
        .mount(&server)
        .await;

    let settings = test_settings(&server);
    let rate_limit_delay = settings.retry.rate_limit_delay;
    let repo = repository(settings);

    let start = Instant::now();
    let result = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await;

    match result {
        Err(TtsError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, TtsError::RateLimited(_)));
        }
        other => panic!("Expected exhausted retries, got {:?}", other),
    }
    // Two delays between three attempts
    assert!(start.elapsed() >= rate_limit_delay * 2);
}

#[tokio::test]
async fn it_should_recover_after_a_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    let url = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await.unwrap();

    assert!(url.ends_with(AUDIO_PATH));
}

#[tokio::test]
async fn it_should_treat_rate_limit_message_as_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Rate limit reached for model"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    let result = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await;

    assert!(result.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn it_should_fail_immediately_on_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "InvalidParameter",
            "message": "voice not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    let result = repo.synthesize("hello", "Nobody", "qwen3-tts-flash").await;

    match result {
        Err(TtsError::Service(message)) => assert_eq!(message, "voice not found"),
        other => panic!("Expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn it_should_reject_unreadable_responses_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    let result = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await;

    assert!(matches!(result, Err(TtsError::InvalidResponse(_))));
}

#[tokio::test]
async fn it_should_retry_timeouts_with_the_short_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = test_settings(&server);
    settings.request_timeout = Duration::from_millis(100);
    settings.retry.max_attempts = 2;
    let repo = repository(settings);

    let result = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await;

    match result {
        Err(TtsError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, TtsError::Timeout));
        }
        other => panic!("Expected exhausted retries, got {:?}", other),
    }
}

#[tokio::test]
async fn it_should_report_download_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AUDIO_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("clip.wav");
    let repo = repository(test_settings(&server));

    let result = repo.synthesize_segment("hello", &dest).await;

    assert!(matches!(result, Err(TtsError::Download(ref msg)) if msg.contains("404")));
    assert!(!dest.exists());
}

#[tokio::test]
async fn it_should_check_availability_with_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .and(body_partial_json(json!({ "input": { "text": "你好" } })))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    let result = repo.check_availability().await;

    assert!(matches!(
        result,
        Err(TtsError::RetriesExhausted { attempts: 1, .. })
    ));
}

#[tokio::test]
async fn it_should_report_available_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(test_settings(&server));
    assert!(repo.check_availability().await.is_ok());
}

#[tokio::test]
async fn it_should_not_call_the_service_without_an_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(speech_success(&server))
        .expect(0)
        .mount(&server)
        .await;

    let repo = repository(DashScopeSettings {
        api_key: String::new(),
        ..test_settings(&server)
    });

    assert!(matches!(repo.check_availability().await, Err(TtsError::MissingApiKey)));
}

#[tokio::test]
async fn it_should_share_the_quota_across_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(4)
        .mount(&server)
        .await;

    let window = Duration::from_millis(300);
    let limiter = Arc::new(QuotaLimiter::new(2, window).unwrap());
    let repo = DashScopeTtsRepository::new(test_settings(&server), limiter).unwrap();

    let start = Instant::now();
    let calls = (0..4).map(|_| repo.synthesize("hello", "Maia", "qwen3-tts-flash"));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    // The third and fourth requests wait for the window to slide
    assert!(start.elapsed() >= window);
}

#[tokio::test]
async fn it_should_retry_connection_failures_with_the_short_delay() {
    let server = MockServer::start().await;
    let mut settings = test_settings(&server);
    // Nothing listens on the discard port
    settings.api_url = "http://127.0.0.1:9/api/v1/tts".to_string();
    let transient_delay = settings.retry.transient_delay;
    let repo = repository(settings);

    let start = Instant::now();
    let result = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await;

    match result {
        Err(TtsError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, TtsError::Connection(_)));
        }
        other => panic!("Expected exhausted retries, got {:?}", other),
    }
    assert!(start.elapsed() >= transient_delay * 2);
}

#[tokio::test]
async fn it_should_report_download_timeouts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AUDIO_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(wav_bytes(100, 0))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut settings = test_settings(&server);
    settings.download_timeout = Duration::from_millis(100);
    let repo = repository(settings);

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("clip.wav");
    let result = repo.synthesize_segment("hello", &dest).await;

    assert!(matches!(result, Err(TtsError::Download(ref msg)) if msg.contains("timed out")));
    assert!(!dest.exists());
}

#[tokio::test]
async fn it_should_succeed_after_a_timeout_once_the_short_delay_passes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TTS_PATH))
        .respond_with(speech_success(&server))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = test_settings(&server);
    settings.request_timeout = Duration::from_millis(200);
    settings.retry.transient_delay = Duration::from_millis(100);
    let request_timeout = settings.request_timeout;
    let transient_delay = settings.retry.transient_delay;
    let rate_limit_delay = settings.retry.rate_limit_delay;
    let repo = repository(settings);

    let start = Instant::now();
    let url = repo.synthesize("hello", "Maia", "qwen3-tts-flash").await.unwrap();
    let elapsed = start.elapsed();

    assert!(url.ends_with(AUDIO_PATH));
    assert!(elapsed >= request_timeout + transient_delay);
    // One short delay, not the rate-limit delay on top of it
    assert!(elapsed < request_timeout + transient_delay + rate_limit_delay + Duration::from_secs(1));
}
