//! HTTP audio fetcher adapter

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{AudioFetcher, FetchError};
use crate::domain::audio::{url_extension, AudioData, AudioMimeType};

/// Downloads candidate recordings with a bounded timeout.
///
/// The MIME hint comes from the URL extension, not the response headers:
/// recording servers routinely mislabel audio as octet-stream.
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<AudioData, FetchError> {
        debug!(url, "downloading recording candidate");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let mime = AudioMimeType::from_extension(url_extension(url).unwrap_or_default());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(AudioData::new(bytes.to_vec(), mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn downloads_bytes_with_extension_mime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/monitor/ABC123.wav"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let fetcher = HttpAudioFetcher::new(Duration::from_secs(5));
        let audio = fetcher
            .fetch(&format!("{}/monitor/ABC123.wav", server.uri()))
            .await
            .unwrap();

        assert_eq!(audio.size_bytes(), 4096);
        assert_eq!(audio.mime_type(), AudioMimeType::Wav);
    }

    #[tokio::test]
    async fn error_status_surfaces_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpAudioFetcher::new(Duration::from_secs(5));
        let result = fetcher.fetch(&format!("{}/gone.mp3", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Http(404))));
    }

    #[tokio::test]
    async fn unknown_extension_defaults_to_mp3() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
            .mount(&server)
            .await;

        let fetcher = HttpAudioFetcher::new(Duration::from_secs(5));
        let audio = fetcher
            .fetch(&format!("{}/monitor/ABC123.gsm", server.uri()))
            .await
            .unwrap();
        assert_eq!(audio.mime_type(), AudioMimeType::Mp3);
    }
}
