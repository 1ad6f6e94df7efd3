use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use regex::Regex;

use crate::completion::{ChatMessage, CompletionError, CompletionService};
use crate::transcript::{format_timestamp, parse_timestamp};
use crate::{Error, Result};

/// Largest transcript, in characters, sent in a single completion request
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

const SYSTEM_PROMPT: &str = "You create labeled chapters for YouTube videos from their transcripts. \
The transcript has a timestamp on one line and the text spoken at that timestamp on the next line, repeating for the whole transcript. \
Each chapter title should be concise, no longer than 50 characters. \
The chapter titles can be keywords, summarized concepts or titles. \
Only create a new chapter when the topic changes significantly. \
At least 2 minutes should have elapsed before starting a new chapter. \
Only use timestamps that appear in the transcript, and never one greater than the largest timestamp in the transcript. \
Output one chapter per line and nothing else. Each line should look like: 00:00:00 Title";

static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*]\s+)?(\d{1,3}:\d{2}(?::\d{2})?)\s*(?:[-:|\u{2013}\u{2014}]\s*)?(\S.*?)\s*$")
        .expect("valid regex")
});

/// A chapter start and its title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub start: u64,
    pub title: String,
}

impl ChapterEntry {
    pub fn timestamp(&self) -> String {
        format_timestamp(self.start)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterSet {
    pub entries: Vec<ChapterEntry>,
}

impl ChapterSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Display for ChapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {}", entry.timestamp(), entry.title)?;
        }
        Ok(())
    }
}

/// Turns transcripts into chapter lists via a completion service.
///
/// Transcripts longer than the chunk size are cut into fixed-size character
/// chunks that are chapterized one after another, each as a standalone
/// transcript. A failure on any chunk fails the whole call.
pub struct Chapterizer {
    service: Box<dyn CompletionService>,
    chunk_size: usize,
    audit_dir: Option<PathBuf>,
}

impl Chapterizer {
    pub fn new(service: Box<dyn CompletionService>) -> Self {
        Self {
            service,
            chunk_size: DEFAULT_CHUNK_SIZE,
            audit_dir: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Write every raw completion response as JSON under `dir`
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    pub async fn chapterize(&self, transcript: &str, credential: &str) -> Result<ChapterSet> {
        if transcript.trim().is_empty() {
            return Err(Error::MissingInput);
        }
        if credential.trim().is_empty() {
            return Err(Error::MissingCredential);
        }

        let length = transcript.chars().count();
        let estimated_tokens = estimate_tokens(length);
        info!("Chapterizing {length} characters (token estimate: {estimated_tokens})");

        let chunks = split_chunks(transcript, self.chunk_size);
        if chunks.len() > 1 {
            info!("Transcript exceeds {} characters, using {} chunks", self.chunk_size, chunks.len());
        }

        let mut chapters = ChapterSet::default();
        for (index, chunk) in chunks.iter().enumerate() {
            let content = self
                .request_chapters(index, chunk, credential)
                .await
                .map_err(|e| match e {
                    CompletionError::InvalidRequest(message) => {
                        warn!("Completion rejected chunk {index}: {message}");
                        Error::TranscriptTooLong { estimated_tokens }
                    }
                    CompletionError::Failed(message) => {
                        warn!("Completion failed on chunk {index}: {message}");
                        Error::CompletionFailed(message)
                    }
                })?;
            chapters.entries.extend(parse_chapters(&content));
        }

        Ok(chapters)
    }

    async fn request_chapters(
        &self,
        index: usize,
        chunk: &str,
        credential: &str,
    ) -> std::result::Result<String, CompletionError> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(chunk)];
        debug!("Submitting chunk {index} ({} characters)", chunk.chars().count());

        let completion = self.service.complete(credential, &messages).await?;
        if let Some(dir) = &self.audit_dir {
            if let Err(e) = write_audit(dir, index, &completion.raw) {
                warn!("Failed to write completion audit to {}: {e}", dir.display());
            }
        }
        Ok(completion.content)
    }
}

/// Roughly four characters per token
pub fn estimate_tokens(chars: usize) -> usize {
    (chars + 2) / 4
}

fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest.char_indices().nth(size).map(|(i, _)| i).unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

fn parse_chapters(content: &str) -> Vec<ChapterEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = CHAPTER_LINE.captures(line).and_then(|caps| {
                Some(ChapterEntry {
                    start: parse_timestamp(&caps[1])?,
                    title: caps[2].to_string(),
                })
            });
            if parsed.is_none() {
                debug!("Ignoring non-chapter line: {line}");
            }
            parsed
        })
        .collect()
}

fn write_audit(dir: &Path, index: usize, raw: &serde_json::Value) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let path = dir.join(format!("{millis}-{index}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(raw)?)?;
    debug!("Wrote completion audit: {}", path.display());
    Ok(())
}
