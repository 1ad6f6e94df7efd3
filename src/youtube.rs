use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;

use crate::transcript::{Transcript, TranscriptLine};
use crate::{Error, Result, VideoId};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Filler cues that carry no speech
const IGNORED_CUES: &[&str] = &["[Music]", "foreign"];

static CAPTION_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"playerCaptionsTracklistRenderer":\{"captionTracks":\[\{"baseUrl":"(.*?)","#).expect("valid regex")
});

/// Anything that can produce a transcript for a video.
///
/// `Ok(None)` means the video has no usable caption track, which also covers
/// the watch page no longer matching the expected layout.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &VideoId) -> Result<Option<Transcript>>;
}

/// Scrapes the first caption track advertised on the YouTube watch page
pub struct YouTubeSource {
    client: reqwest::Client,
    watch_url: String,
}

impl YouTubeSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            watch_url: WATCH_URL.to_string(),
        }
    }

    /// Use a different watch page prefix; the video id is appended to it
    pub fn with_watch_url(mut self, watch_url: impl Into<String>) -> Self {
        self.watch_url = watch_url.into();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::upstream(url, e))?
            .text()
            .await
            .map_err(|e| Error::upstream(url, e))
    }
}

#[async_trait]
impl TranscriptSource for YouTubeSource {
    async fn fetch(&self, video_id: &VideoId) -> Result<Option<Transcript>> {
        let watch_url = format!("{}{video_id}", self.watch_url);
        debug!("Fetching watch page: {watch_url}");
        let page_html = self.get_text(&watch_url).await?;

        let Some(caption_url) = extract_caption_url(&page_html) else {
            debug!("No caption track found on watch page for {video_id}");
            return Ok(None);
        };

        debug!("Fetching caption track: {caption_url}");
        let caption_xml = self.get_text(&caption_url).await?;
        let lines = parse_caption_xml(&caption_xml, &caption_url)?;
        debug!("Parsed {} caption lines for {video_id}", lines.len());

        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(Transcript::new(video_id.clone(), lines)))
    }
}

fn extract_caption_url(html: &str) -> Option<String> {
    let caps = CAPTION_URL.captures(html)?;
    Some(caps[1].replace("\\u0026", "&").replace("&amp;", "&"))
}

fn parse_caption_xml(xml: &str, url: &str) -> Result<Vec<TranscriptLine>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    // Some(start) while inside a <text> element; the inner Option is the parsed start attribute
    let mut current: Option<Option<f64>> = None;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let start = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"start")
                    .and_then(|a| String::from_utf8_lossy(&a.value).parse::<f64>().ok());
                current = Some(start);
                buf.clear();
            }
            Ok(Event::Text(ref e)) if current.is_some() => match e.unescape() {
                Ok(text) => buf.push_str(&text),
                Err(_) => buf.push_str(&String::from_utf8_lossy(e)),
            },
            Ok(Event::CData(ref e)) if current.is_some() => {
                buf.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some(start) = current.take() {
                    if let Some(line) = build_line(start, &buf) {
                        lines.push(line);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::upstream(url, format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(lines)
}

fn build_line(start: Option<f64>, raw: &str) -> Option<TranscriptLine> {
    let text = html_escape::decode_html_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() || IGNORED_CUES.contains(&text.as_str()) {
        return None;
    }

    match start {
        Some(start) if start.is_finite() && start >= 0.0 => Some(TranscriptLine {
            start: start.floor() as u64,
            text,
        }),
        _ => {
            debug!("Skipping cue without a usable start time: {text}");
            None
        }
    }
}
