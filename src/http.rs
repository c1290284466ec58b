/// Outbound HTTP policy shared by the embedding, search and chat clients.
///
/// Every upstream call goes through the same timeout and the same retry
/// loop, so the three stages cannot drift apart in how they fail.
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub max_retries: usize,
    pub retry_backoff: Duration,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl HttpPolicy {
    /// Build a JSON client carrying `headers` on every request.
    pub fn client(&self, mut headers: HeaderMap) -> reqwest::Result<Client> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
    }

    /// Send the request built by `make`, retrying transient failures.
    ///
    /// Non-success responses that are not retryable (or that exhaust the
    /// budget) are returned as-is so the caller can report the body.
    pub async fn send<F>(&self, make: F) -> reqwest::Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0usize;
        loop {
            match make().send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if should_retry(status) && attempt < self.max_retries {
                        attempt += 1;
                        debug!("upstream returned {status}, retry {attempt}/{}", self.max_retries);
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt < self.max_retries {
                        attempt += 1;
                        debug!("upstream request failed ({err}), retry {attempt}/{}", self.max_retries);
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        self.retry_backoff * (1u32 << capped)
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Read an error body for reporting, tolerating unreadable bodies.
pub(crate) async fn error_body(resp: Response) -> String {
    resp.text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string())
}
