use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid video id: {0:?}")]
    InvalidInput(String),

    #[error("missing transcript")]
    MissingInput,

    #[error("missing API credential")]
    MissingCredential,

    #[error("no transcript available for video {0}")]
    NoTranscriptAvailable(String),

    #[error("failed to fetch {url}: {reason}")]
    UpstreamFetchFailed { url: String, reason: String },

    #[error("transcript too long for the model (estimated {estimated_tokens} tokens), try a shorter video")]
    TranscriptTooLong { estimated_tokens: usize },

    #[error("completion failed: {0}")]
    CompletionFailed(String),
}

impl Error {
    pub(crate) fn upstream(url: &str, err: impl std::fmt::Display) -> Self {
        Self::UpstreamFetchFailed {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
