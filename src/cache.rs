use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::VideoId;
use crate::transcript::Transcript;

/// One week
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

struct Entry {
    transcript: Transcript,
    inserted: Instant,
}

/// In-memory transcript cache keyed by video id.
///
/// Entries expire `ttl` after insertion and are dropped lazily on lookup or
/// by `purge_expired`. Nothing is persisted across restarts.
pub struct TranscriptCache {
    ttl: Duration,
    entries: Mutex<HashMap<VideoId, Entry>>,
}

impl Default for TranscriptCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TranscriptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load a cached transcript, if present and not expired.
    pub fn get(&self, video_id: &VideoId) -> Option<Transcript> {
        let mut entries = self.lock();
        match entries.get(video_id) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                debug!("Cache hit: {video_id}");
                return Some(entry.transcript.clone());
            }
            Some(_) => debug!("Cache entry expired: {video_id}"),
            None => return None,
        }
        entries.remove(video_id);
        None
    }

    /// Store a transcript, replacing any previous entry for the same video.
    pub fn set(&self, video_id: VideoId, transcript: Transcript) {
        debug!("Cached transcript: {video_id}");
        self.lock().insert(
            video_id,
            Entry {
                transcript,
                inserted: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.inserted.elapsed() < self.ttl);
        before - entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<VideoId, Entry>> {
        // A poisoned map still holds valid entries
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
