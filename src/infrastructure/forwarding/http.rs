//! HTTP forwarder adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::application::ports::{ForwardError, Forwarder};

/// Posts canonical event bodies to the downstream automation endpoint.
///
/// Downstream error statuses are reported as Ok: the relay does not
/// interpret downstream semantics, only transport-level failure.
pub struct HttpForwarder {
    downstream_url: String,
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(downstream_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            downstream_url: downstream_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn deliver(
        &self,
        payload: &str,
        request_id: &str,
        attempt: u32,
    ) -> Result<u16, ForwardError> {
        debug!(request_id, attempt, url = %self.downstream_url, "posting downstream");
        let response = self
            .client
            .post(&self.downstream_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwardError::Timeout
                } else {
                    ForwardError::Transport(e.to_string())
                }
            })?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_the_body_form_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("src=1001&userfield=ABC123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let forwarder = HttpForwarder::new(server.uri(), Duration::from_secs(5));
        let status = forwarder
            .deliver("src=1001&userfield=ABC123", "req-0001", 1)
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn downstream_error_status_is_still_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let forwarder = HttpForwarder::new(server.uri(), Duration::from_secs(5));
        let status = forwarder.deliver("src=1001", "req-0001", 1).await.unwrap();
        assert_eq!(status, 503);
    }

    #[tokio::test]
    async fn unreachable_downstream_is_a_transport_error() {
        // Reserved port with nothing listening
        let forwarder = HttpForwarder::new("http://127.0.0.1:1", Duration::from_secs(2));
        let result = forwarder.deliver("src=1001", "req-0001", 1).await;
        assert!(matches!(result, Err(ForwardError::Transport(_))));
    }

    #[tokio::test]
    async fn slow_downstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let forwarder = HttpForwarder::new(server.uri(), Duration::from_millis(100));
        let result = forwarder.deliver("src=1001", "req-0001", 1).await;
        assert!(matches!(result, Err(ForwardError::Timeout)));
    }
}
