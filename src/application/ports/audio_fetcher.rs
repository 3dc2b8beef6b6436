//! Audio download port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;

/// Audio download errors
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Upstream returned status {0}")]
    Http(u16),

    #[error("Download transport failed: {0}")]
    Transport(String),

    #[error("Body too small to be audio: {0} bytes")]
    TooSmall(usize),
}

/// Port for downloading candidate recordings
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download one candidate URL with a bounded timeout.
    ///
    /// # Returns
    /// The audio bytes with a MIME hint derived from the URL extension.
    /// Small bodies are returned as-is; the orchestrator applies the
    /// minimum plausible size guard.
    async fn fetch(&self, url: &str) -> Result<AudioData, FetchError>;
}
