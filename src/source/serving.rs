//! Remote image-serving endpoint
//!
//! The endpoint already knows how to return a blob cropped to a centered
//! square of a given side (the `=s{side}-c` suffix convention of hosted image
//! services). Request URLs come from a template:
//!
//! ```text
//! {base}/{blob}=s{side}-c
//! ```
//!
//! `{base}` is the configured base URL, `{blob}` the percent-encoded blob
//! reference and `{side}` the square side in pixels.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use super::{ImageSource, SourceError};
use crate::blob::BlobRef;
use crate::config::ServingUrlConfig;
use crate::retry::RetryPolicy;

pub struct ServingUrlSource {
    http_client: reqwest::Client,
    base_url: String,
    url_template: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ServingUrlSource {
    /// # Errors
    ///
    /// Returns `SourceError::Config` if the template lacks a `{blob}` or
    /// `{side}` placeholder, or the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        url_template: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SourceError> {
        let url_template = url_template.into();
        for placeholder in ["{blob}", "{side}"] {
            if !url_template.contains(placeholder) {
                return Err(SourceError::Config(format!(
                    "url_template '{}' is missing {}",
                    url_template, placeholder
                )));
            }
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            url_template,
            timeout,
            retry,
        })
    }

    pub fn from_config(config: &ServingUrlConfig) -> Result<Self, SourceError> {
        Self::new(
            config.base_url.clone(),
            config.url_template.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.retry.clone(),
        )
    }

    pub fn url_for(&self, blob_ref: &BlobRef, side: u32) -> String {
        self.url_template
            .replace("{base}", &self.base_url)
            .replace("{blob}", &urlencoding::encode(blob_ref.as_str()))
            .replace("{side}", &side.to_string())
    }

    async fn fetch_once(&self, url: &str) -> Result<Bytes, SourceError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.bytes().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ImageSource for ServingUrlSource {
    async fn fetch_square(&self, blob_ref: &BlobRef, side: u32) -> Result<Bytes, SourceError> {
        let url = self.url_for(blob_ref, side);
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url).await {
                Err(SourceError::Status { status, .. })
                    if self.retry.should_retry(attempt, status) =>
                {
                    attempt += 1;
                    let delay = self.retry.backoff_duration(attempt);
                    tracing::warn!(
                        url = %url,
                        status = status,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying image fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 server answering each connection with the next
    /// `(status, body)` pair; the last pair repeats. Returns its base URL and
    /// a request counter.
    async fn spawn_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];

                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nContent-Type: image/jpeg\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn source(base: &str, retry: RetryPolicy) -> ServingUrlSource {
        ServingUrlSource::new(
            base,
            "{base}/{blob}=s{side}-c",
            Duration::from_secs(5),
            retry,
        )
        .unwrap()
    }

    #[test]
    fn test_url_for_substitutes_placeholders() {
        let source = source("https://images.example.com/", RetryPolicy::none());
        assert_eq!(
            source.url_for(&BlobRef::new("creatures/abc 1"), 200),
            "https://images.example.com/creatures%2Fabc%201=s200-c"
        );
    }

    #[test]
    fn test_template_must_have_placeholders() {
        let result = ServingUrlSource::new(
            "https://x",
            "{base}/static.jpg",
            Duration::from_secs(1),
            RetryPolicy::none(),
        );
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_square_passes_bytes_through() {
        let (base, hits) = spawn_server(vec![(200, "square-bytes")]).await;
        let source = source(&base, RetryPolicy::none());

        let bytes = source.fetch_square(&BlobRef::new("b1"), 100).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"square-bytes"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (base, hits) = spawn_server(vec![(404, "")]).await;
        let source = source(&base, RetryPolicy::new(3, 1, 1));

        let err = source.fetch_square(&BlobRef::new("b1"), 100).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 404, .. }));
        // 404 is final even with retries configured
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let (base, hits) = spawn_server(vec![(503, ""), (200, "ok")]).await;
        let source = source(&base, RetryPolicy::none());

        let err = source.fetch_square(&BlobRef::new("b1"), 100).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_configured_retry_recovers_from_5xx() {
        let (base, hits) = spawn_server(vec![(503, ""), (200, "ok")]).await;
        let source = source(&base, RetryPolicy::new(3, 1, 5));

        let bytes = source.fetch_square(&BlobRef::new("b1"), 100).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"ok"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let source = ServingUrlSource::new(
            format!("http://{}", addr),
            "{base}/{blob}=s{side}-c",
            Duration::from_millis(200),
            RetryPolicy::none(),
        )
        .unwrap();

        let err = source.fetch_square(&BlobRef::new("b1"), 10).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = source(&format!("http://{}", addr), RetryPolicy::none());
        let err = source.fetch_square(&BlobRef::new("b1"), 10).await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)), "got {err:?}");
    }
}
