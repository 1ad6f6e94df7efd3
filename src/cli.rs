use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytchap",
    about = "YouTube transcript fetcher and chapter generator",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format: text (default), json
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Show extraction details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the timestamped transcript of a video
    Transcript {
        /// YouTube video URL or video ID
        video: String,
    },

    /// Generate chapters for a video via an LLM
    Chapterize {
        /// YouTube video URL or video ID
        video: String,

        /// API key for the completion provider
        #[arg(long, env = "YTCHAP_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// LLM model used to generate chapters
        #[arg(long)]
        model: Option<String>,

        /// Base URL of the completion API
        #[arg(long)]
        api_base: Option<String>,

        /// Maximum characters per completion request
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Save raw completion responses to this directory
        #[arg(long)]
        audit_dir: Option<PathBuf>,
    },
}
