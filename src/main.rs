use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{debug, info};

use ytchap::cache::TranscriptCache;
use ytchap::chapterize::Chapterizer;
use ytchap::completion;
use ytchap::config::Config;
use ytchap::fetcher::TranscriptFetcher;
use ytchap::output;
use ytchap::youtube::YouTubeSource;

mod cli;

use cli::{Cli, Command, OutputFormat};

const SUPPORTED_FORMATS: &str = "Supported formats:
  https://www.youtube.com/watch?v=ID
  https://youtu.be/ID
  https://www.youtube.com/embed/ID
  https://www.youtube.com/shorts/ID
  <11-character video ID>";

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytchap.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytchap")
        .join("logs")
}

fn emit(cli: &Cli, rendered: String) -> Result<()> {
    let rendered = output::ensure_trailing_newline(rendered);
    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        print!("{rendered}");
    }
    Ok(())
}

/// The `--api-key` flag, or the provider's conventional environment variable
fn resolve_credential(api_key: Option<&str>, model: &str) -> Result<String> {
    let credential = api_key
        .map(str::to_string)
        .or_else(|| std::env::var(completion::api_key_env(model)).ok())
        .unwrap_or_default();
    if credential.trim().is_empty() {
        return Err(ytchap::Error::MissingCredential)
            .wrap_err_with(|| format!("pass --api-key, or set YTCHAP_API_KEY or {}", completion::api_key_env(model)));
    }
    Ok(credential)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config: {e}");
        Config::default()
    });

    if cli.verbose {
        let config_path = ytchap::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let client = reqwest::Client::new();
    let cache = Arc::new(TranscriptCache::new(config.cache_ttl()));
    let fetcher = TranscriptFetcher::new(YouTubeSource::new(client.clone()), cache);

    let video = match &cli.command {
        Command::Transcript { video } | Command::Chapterize { video, .. } => video,
    };
    let video_id = ytchap::extract_video_id(video)
        .wrap_err_with(|| format!("could not extract video ID from: {video}\n\n{SUPPORTED_FORMATS}"))?;

    // Reject a missing credential before any network call
    let credential = match &cli.command {
        Command::Chapterize { api_key, model, .. } => {
            let model = model.as_deref().unwrap_or(config.model());
            Some(resolve_credential(api_key.as_deref(), model)?)
        }
        Command::Transcript { .. } => None,
    };

    let transcript = fetcher
        .fetch_transcript(&video_id)
        .await?
        .ok_or_else(|| ytchap::Error::NoTranscriptAvailable(video_id.to_string()))?;

    if cli.verbose {
        eprintln!("Video: {video_id}\nLines: {}", transcript.lines.len());
    }

    match &cli.command {
        Command::Transcript { .. } => {
            let rendered = match cli.format {
                OutputFormat::Text => output::render_transcript_text(&transcript),
                OutputFormat::Json => output::render_transcript_json(&transcript),
            };
            emit(&cli, rendered)?;
        }
        Command::Chapterize {
            model,
            api_base,
            chunk_size,
            audit_dir,
            ..
        } => {
            let model = model.as_deref().unwrap_or(config.model());
            let api_base = api_base.as_deref().or(config.api_base.as_deref());
            let mut chapterizer = Chapterizer::new(completion::provider_for(client.clone(), model, api_base))
                .with_chunk_size(chunk_size.unwrap_or(config.chunk_size()));
            if let Some(dir) = audit_dir.as_ref().or(config.audit_dir.as_ref()) {
                chapterizer = chapterizer.with_audit_dir(dir.join(video_id.as_str()));
            }

            if cli.verbose {
                eprintln!("Model: {model}");
            }

            let chapters = chapterizer
                .chapterize(&transcript.text(), credential.as_deref().unwrap_or_default())
                .await
                .wrap_err_with(|| format!("failed to chapterize {video_id}"))?;

            let rendered = match cli.format {
                OutputFormat::Text => output::render_chapters_text(&chapters),
                OutputFormat::Json => output::render_chapters_json(&video_id, &chapters),
            };
            emit(&cli, rendered)?;
        }
    }

    Ok(())
}
