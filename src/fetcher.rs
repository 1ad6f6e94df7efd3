use std::sync::Arc;

use log::{debug, info};

use crate::cache::TranscriptCache;
use crate::transcript::Transcript;
use crate::youtube::TranscriptSource;
use crate::{Result, VideoId};

/// Cache-checked front for a `TranscriptSource`
pub struct TranscriptFetcher<S> {
    source: S,
    cache: Arc<TranscriptCache>,
}

impl<S: TranscriptSource> TranscriptFetcher<S> {
    pub fn new(source: S, cache: Arc<TranscriptCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &TranscriptCache {
        &self.cache
    }

    /// Validate `input` as a video id, then fetch its transcript.
    pub async fn fetch(&self, input: &str) -> Result<Option<Transcript>> {
        let video_id = VideoId::parse(input)?;
        self.fetch_transcript(&video_id).await
    }

    /// Fetch a transcript, serving from the cache when possible.
    ///
    /// Returns `Ok(None)` when the video has no caption track. Only found
    /// transcripts are cached.
    pub async fn fetch_transcript(&self, video_id: &VideoId) -> Result<Option<Transcript>> {
        if let Some(transcript) = self.cache.get(video_id) {
            return Ok(Some(transcript));
        }

        debug!("Cache miss: {video_id}");
        let transcript = self.source.fetch(video_id).await?;
        match &transcript {
            Some(t) => {
                info!("Fetched transcript for {video_id}: {} lines", t.lines.len());
                self.cache.set(video_id.clone(), t.clone());
            }
            None => info!("No transcript available for {video_id}"),
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::Error;
    use crate::transcript::TranscriptLine;

    struct MockSource {
        calls: Arc<AtomicUsize>,
        has_captions: bool,
    }

    impl MockSource {
        fn new(has_captions: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    has_captions,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl TranscriptSource for MockSource {
        async fn fetch(&self, video_id: &VideoId) -> Result<Option<Transcript>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.has_captions {
                return Ok(None);
            }
            Ok(Some(Transcript::new(
                video_id.clone(),
                vec![
                    TranscriptLine {
                        start: 0,
                        text: "intro".to_string(),
                    },
                    TranscriptLine {
                        start: 125,
                        text: "main topic".to_string(),
                    },
                ],
            )))
        }
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_without_fetch() {
        let (source, calls) = MockSource::new(true);
        let fetcher = TranscriptFetcher::new(source, Arc::new(TranscriptCache::default()));

        for bad in ["1234567890", "dQw4w9WgXcQX", "dQw4w9WgX!Q", "", "dQw4w9 WgXQ"] {
            assert!(matches!(fetcher.fetch(bad).await, Err(Error::InvalidInput(_))), "{bad:?}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_returns_transcript_text() {
        let (source, _) = MockSource::new(true);
        let fetcher = TranscriptFetcher::new(source, Arc::new(TranscriptCache::default()));

        let transcript = fetcher.fetch("qmdHm7M3UGY").await.unwrap().unwrap();
        assert_eq!(transcript.text(), "00:00:00\nintro\n00:02:05\nmain topic\n");
    }

    #[tokio::test]
    async fn test_no_captions_is_not_an_error() {
        let (source, calls) = MockSource::new(false);
        let fetcher = TranscriptFetcher::new(source, Arc::new(TranscriptCache::default()));

        assert!(fetcher.fetch("qmdHm7M3UGY").await.unwrap().is_none());
        assert!(fetcher.fetch("qmdHm7M3UGY").await.unwrap().is_none());
        // misses are not cached
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(fetcher.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_fetch_is_cache_served_until_expiry() {
        let (source, calls) = MockSource::new(true);
        let cache = Arc::new(TranscriptCache::new(Duration::from_secs(3600)));
        let fetcher = TranscriptFetcher::new(source, cache);
        let id = VideoId::parse("qmdHm7M3UGY").unwrap();

        let first = fetcher.fetch_transcript(&id).await.unwrap();
        let second = fetcher.fetch_transcript(&id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        fetcher.fetch_transcript(&id).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
