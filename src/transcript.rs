use serde::Serialize;

use crate::VideoId;

/// A single caption cue, floored to whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub start: u64,
    pub text: String,
}

/// Normalized, timestamped transcript for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new(video_id: VideoId, lines: Vec<TranscriptLine>) -> Self {
        Self { video_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn max_timestamp(&self) -> Option<u64> {
        self.lines.iter().map(|l| l.start).max()
    }

    /// Alternating timestamp/text lines, each terminated by a newline
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&format_timestamp(line.start));
            out.push('\n');
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

/// Render whole seconds as `HH:MM:SS`
pub fn format_timestamp(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse `HH:MM:SS` or `MM:SS` into whole seconds
pub fn parse_timestamp(s: &str) -> Option<u64> {
    let parts = s
        .trim()
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => Some(h * 3600 + m * 60 + s),
        [m, s] if *s < 60 => Some(m * 60 + s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::new(
            VideoId::parse("qmdHm7M3UGY").unwrap(),
            vec![
                TranscriptLine {
                    start: 0,
                    text: "hello world".to_string(),
                },
                TranscriptLine {
                    start: 3725,
                    text: "it's later".to_string(),
                },
            ],
        )
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00");
        assert_eq!(format_timestamp(59), "00:00:59");
        assert_eq!(format_timestamp(61), "00:01:01");
        assert_eq!(format_timestamp(3725), "01:02:05");
        assert_eq!(format_timestamp(360_000), "100:00:00");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("01:02:05"), Some(3725));
        assert_eq!(parse_timestamp("12:30"), Some(750));
        assert_eq!(parse_timestamp(" 00:00:00 "), Some(0));
        assert_eq!(parse_timestamp("00:61"), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
    }

    #[test]
    fn test_text_alternates_timestamp_and_caption() {
        assert_eq!(sample().text(), "00:00:00\nhello world\n01:02:05\nit's later\n");
    }

    #[test]
    fn test_max_timestamp() {
        assert_eq!(sample().max_timestamp(), Some(3725));
        let empty = Transcript::new(VideoId::parse("qmdHm7M3UGY").unwrap(), vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.max_timestamp(), None);
        assert_eq!(empty.text(), "");
    }
}
