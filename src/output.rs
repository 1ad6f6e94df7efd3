use serde::Serialize;

use crate::VideoId;
use crate::chapterize::ChapterSet;
use crate::transcript::{Transcript, format_timestamp};

#[derive(Serialize)]
struct TimedText<'a> {
    timestamp: String,
    text: &'a str,
}

#[derive(Serialize)]
struct TitledChapter<'a> {
    timestamp: String,
    title: &'a str,
}

#[derive(Serialize)]
struct TranscriptView<'a> {
    video_id: &'a VideoId,
    lines: Vec<TimedText<'a>>,
}

#[derive(Serialize)]
struct ChaptersView<'a> {
    video_id: &'a VideoId,
    chapters: Vec<TitledChapter<'a>>,
}

/// Terminate rendered output with exactly one newline
pub fn ensure_trailing_newline(mut rendered: String) -> String {
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}

/// Render transcript as alternating timestamp and caption lines
pub fn render_transcript_text(transcript: &Transcript) -> String {
    transcript.text()
}

pub fn render_transcript_json(transcript: &Transcript) -> String {
    let view = TranscriptView {
        video_id: &transcript.video_id,
        lines: transcript
            .lines
            .iter()
            .map(|l| TimedText {
                timestamp: format_timestamp(l.start),
                text: &l.text,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&view).unwrap_or_default()
}

/// Render chapters as one `HH:MM:SS Title` line each
pub fn render_chapters_text(chapters: &ChapterSet) -> String {
    chapters.to_string()
}

pub fn render_chapters_json(video_id: &VideoId, chapters: &ChapterSet) -> String {
    let view = ChaptersView {
        video_id,
        chapters: chapters
            .entries
            .iter()
            .map(|c| TitledChapter {
                timestamp: c.timestamp(),
                title: &c.title,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&view).unwrap_or_default()
}
