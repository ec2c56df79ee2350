//! HTTP capability: GET with timeout, bounded retries, and cancellation.
//!
//! All network access in the engine goes through [`HttpClient::get`]. Retries
//! apply only to transport failures, 5xx responses, and 429 (honouring
//! `Retry-After`); any other 4xx is surfaced immediately. Backoff doubles from
//! one second with a deterministic jitter so retry timing is reproducible
//! under test. Every attempt emits one structured event.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_LENGTH, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget on retryable failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default response size ceiling (64 MiB covers the GIAS extract with room).
pub const DEFAULT_MAX_SIZE: usize = 64 * 1024 * 1024;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const JITTER_CAP_MS: u64 = 250;

/// Options for a single fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Optional `Accept` header value.
    pub accept: Option<String>,
    /// Maximum response body size in bytes.
    pub max_size: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            accept: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl FetchOptions {
    /// Options with a caller-supplied timeout and everything else default.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// A fetched response body plus the metadata drivers care about.
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, when the server sent one.
    pub content_type: Option<String>,
    /// URL after redirects.
    pub final_url: String,
}

impl FetchedPayload {
    /// Body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// HTTP client shared by every driver in a run.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default per-request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("psb/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| Error::Transport {
                url: String::new(),
                detail: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Fetch a URL, retrying retryable failures within the options' budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] as soon as the token fires, otherwise the
    /// terminal error of the last attempt: [`Error::Timeout`],
    /// [`Error::Transport`], [`Error::HttpStatus`], or [`Error::SizeExceeded`].
    pub async fn get(
        &self,
        url: &str,
        opts: &FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<FetchedPayload> {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            debug!(url, attempt, "fetch attempt");
            let outcome = tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.attempt(url, opts) => outcome,
            };

            match outcome {
                Ok(payload) => {
                    debug!(url, bytes = payload.bytes.len(), "fetch succeeded");
                    return Ok(payload);
                }
                Err(AttemptError { error, retry_after }) => {
                    if !error.is_recoverable() || attempt >= opts.max_retries {
                        return Err(error);
                    }
                    let delay = retry_after.unwrap_or_else(|| backoff_delay(url, attempt));
                    warn!(
                        url,
                        attempt,
                        category = error.category(),
                        delay_ms = delay.as_millis() as u64,
                        "retrying after failure: {error}"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> std::result::Result<FetchedPayload, AttemptError> {
        let mut request = self.client.get(url).timeout(opts.timeout);
        if let Some(accept) = &opts.accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request.send().await.map_err(|e| AttemptError {
            error: classify_reqwest(url, &e),
            retry_after: None,
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
                .then(|| parse_retry_after(&response))
                .flatten();
            return Err(AttemptError {
                error: Error::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                },
                retry_after,
            });
        }

        if let Some(declared) = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok())
        {
            if declared > opts.max_size {
                return Err(AttemptError {
                    error: Error::SizeExceeded {
                        url: url.to_string(),
                        limit: opts.max_size,
                    },
                    retry_after: None,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let final_url = response.url().to_string();

        let bytes = read_bounded(response, url, opts.max_size)
            .await
            .map_err(|error| AttemptError {
                error,
                retry_after: None,
            })?;

        Ok(FetchedPayload {
            bytes,
            content_type,
            final_url,
        })
    }
}

struct AttemptError {
    error: Error,
    retry_after: Option<Duration>,
}

async fn read_bounded(mut response: Response, url: &str, max_size: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| classify_reqwest(url, &e))? {
        if body.len() + chunk.len() > max_size {
            return Err(Error::SizeExceeded {
                url: url.to_string(),
                limit: max_size,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn classify_reqwest(url: &str, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
        }
    } else {
        Error::Transport {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Doubling backoff with a deterministic jitter derived from the URL and the
/// attempt number, so test runs observe identical timing.
fn backoff_delay(url: &str, attempt: u32) -> Duration {
    let base = INITIAL_BACKOFF * 2u32.saturating_pow(attempt);
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(attempt.to_le_bytes());
    let digest = hasher.finalize();
    let jitter_ms = u64::from(u16::from_le_bytes([digest[0], digest[1]])) % JITTER_CAP_MS;
    base + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick_opts() -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(2),
            max_retries: 2,
            accept: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    #[tokio::test]
    async fn fetches_body_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"results\":[]}")
                    .insert_header("content-type", "application/json"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/orgs.json", server.uri());
        let payload = client
            .get(&url, &quick_opts(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(payload.text(), "{\"results\":[]}");
        assert_eq!(payload.content_type.as_deref(), Some("application/json"));
        assert!(payload.final_url.ends_with("/orgs.json"));
    }

    #[tokio::test]
    async fn sends_accept_header_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("accept", "text/csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let opts = FetchOptions {
            accept: Some("text/csv".into()),
            ..quick_opts()
        };
        let url = format!("{}/feed", server.uri());
        let payload = client.get(&url, &opts, &CancellationToken::new()).await.unwrap();
        assert_eq!(payload.text(), "a,b");
    }

    #[tokio::test]
    async fn retries_5xx_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/flaky", server.uri());
        let payload = client
            .get(&url, &quick_opts(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(payload.text(), "ok");
    }

    #[tokio::test]
    async fn does_not_retry_plain_4xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/gone", server.uri());
        let err = client
            .get(&url, &quick_opts(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::HttpStatus { status: 404, .. } => {}
            other => panic!("expected HttpStatus(404), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exhausts_retry_budget_on_persistent_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // initial attempt + 2 retries
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/down", server.uri());
        let err = client
            .get(&url, &quick_opts(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn enforces_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let opts = FetchOptions {
            max_size: 1024,
            ..quick_opts()
        };
        let url = format!("{}/big", server.uri());
        let err = client
            .get(&url, &opts, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SizeExceeded { limit: 1024, .. }));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let cancel = CancellationToken::new();
        let url = format!("{}/slow", server.uri());

        let opts = quick_opts();
        let pending = client.get(&url, &opts, &cancel);
        cancel.cancel();
        let err = pending.await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn honours_retry_after_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(200).set_body_string("through"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/limited", server.uri());
        let payload = client
            .get(&url, &quick_opts(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(payload.text(), "through");
    }

    #[test]
    fn backoff_is_deterministic_and_doubles() {
        let a0 = backoff_delay("https://example.com", 0);
        let a0_again = backoff_delay("https://example.com", 0);
        assert_eq!(a0, a0_again);

        let a1 = backoff_delay("https://example.com", 1);
        assert!(a1 >= Duration::from_secs(2));
        assert!(a0 < Duration::from_secs(2));
    }
}
