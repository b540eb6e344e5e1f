use anyhow::Context;
use podcast_tts::domain::podcast::{PodcastService, PodcastServiceApi};
use podcast_tts::infrastructure::audio::{ffmpeg_available, FFMPEG_PROGRAM};
use podcast_tts::infrastructure::config::{Config, LogFormat};
use podcast_tts::infrastructure::ratelimit::QuotaLimiter;
use podcast_tts::infrastructure::repositories::DashScopeTtsRepository;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: podcast-tts generate <script-file> <output-path>\n       podcast-tts check";

enum Command {
    Generate { script: PathBuf, output: PathBuf },
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let command = match parse_args(std::env::args().skip(1).collect()) {
        Some(command) => command,
        None => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    // Initialize logging
    init_logging(&config);

    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "podcast-tts failed");
            let message = e
                .downcast_ref::<podcast_tts::error::PodcastError>()
                .map(|err| err.user_message().to_string())
                .unwrap_or_else(|| format!("{e:#}"));
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Option<Command> {
    match args.as_slice() {
        [cmd, script, output] if cmd == "generate" => Some(Command::Generate {
            script: PathBuf::from(script),
            output: PathBuf::from(output),
        }),
        [cmd] if cmd == "check" => Some(Command::Check),
        _ => None,
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    // === DEPENDENCY INJECTION SETUP ===
    // 1. Account-wide quota, shared by every request this process makes
    let limiter = Arc::new(
        QuotaLimiter::new(config.tts_quota_requests, config.quota_window())
            .context("invalid TTS quota settings")?,
    );
    tracing::info!(
        requests = limiter.capacity(),
        window_secs = limiter.window().as_secs(),
        "TTS quota limiter created"
    );

    // 2. Instantiate repositories
    let tts_repo = Arc::new(
        DashScopeTtsRepository::new(config.tts_settings(), limiter)
            .context("failed to build HTTP client")?,
    );
    tracing::info!(
        voice = %tts_repo.settings().voice,
        model = %tts_repo.settings().model,
        max_weighted_chars = tts_repo.settings().max_weighted_chars,
        "DashScope TTS repository initialized"
    );

    match command {
        Command::Check => {
            tts_repo.check_availability().await?;
            tracing::info!("TTS service is available");
            println!("TTS service is available");

            let has_ffmpeg = tokio::task::spawn_blocking(|| ffmpeg_available(FFMPEG_PROGRAM))
                .await
                .unwrap_or(false);
            if has_ffmpeg {
                println!("ffmpeg found, mp3 output available");
            } else {
                tracing::warn!("ffmpeg not found on PATH, only .wav output will work");
                println!("ffmpeg not found, only .wav output available");
            }
        }
        Command::Generate { script, output } => {
            let script_text = tokio::fs::read_to_string(&script)
                .await
                .with_context(|| format!("failed to read script {}", script.display()))?;

            // 3. Instantiate services
            let podcast_service = PodcastService::new(tts_repo, config.podcast_settings());

            let path = podcast_service
                .generate_podcast_audio(&script_text, &output, Some(config.temp_dir.as_path()))
                .await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "podcast_tts=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "podcast_tts=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
