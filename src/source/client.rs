//! Standings source client.
//!
//! Features:
//! - Browser-like headers for web pages, API-key header for JSON APIs
//! - Per-attempt timeout
//! - Bounded retries with a fixed delay on transient failures
//!
//! The network sits behind the `Transport` trait so the retry loop can be
//! driven by scripted responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::data::models::{ContentKind, RawDocument};
use crate::errors::StandingsError;

use super::errors::FetchError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// =============================================================================
// Transport
// =============================================================================

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Body of a 2xx response, or the error describing the status.
    pub fn into_body(self) -> Result<String, FetchError> {
        if (200..300).contains(&self.status) {
            Ok(self.body)
        } else {
            Err(FetchError::from_status(self.status, &self.body))
        }
    }
}

/// One GET request. Implementations must not retry internally.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, FetchError>;
}

/// `reqwest`-backed transport. Build once and reuse across attempts.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        // `text()` decodes lossily, so a failure here means the connection
        // broke while the body was streaming.
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;
        Ok(TransportResponse { status, body })
    }
}

// =============================================================================
// Request description
// =============================================================================

/// Where the standings come from and how to authenticate.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub address: String,
    pub kind: ContentKind,
    pub user_agent: String,
    /// `(header name, key)` for JSON APIs.
    pub api_key: Option<(String, String)>,
}

impl SourceRequest {
    pub fn web_page(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            kind: ContentKind::Markup,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: None,
        }
    }

    pub fn json_api(
        address: impl Into<String>,
        header: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            kind: ContentKind::Json,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: Some((header.into(), key.into())),
        }
    }

    /// Parse the address, accepting only http(s).
    pub fn url(&self) -> Result<Url, FetchError> {
        let url = Url::parse(&self.address)
            .map_err(|e| FetchError::InvalidAddress(format!("{}: {e}", self.address)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::InvalidAddress(format!(
                "{}: unsupported scheme {other}",
                self.address
            ))),
        }
    }

    pub fn headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| FetchError::InvalidHeader(format!("User-Agent: {e}")))?,
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let accept = match self.kind {
            ContentKind::Markup => "text/html,application/xhtml+xml",
            ContentKind::Json => "application/json",
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        if let Some((name, key)) = &self.api_key {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::InvalidHeader(format!("{name}: {e}")))?;
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| FetchError::InvalidHeader(format!("{name}: {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

/// Attempt budget for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Applies to each attempt, not the whole run.
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl FetchPolicy {
    /// Worst-case wall time a caller should budget for one fetch.
    pub fn worst_case(&self) -> Duration {
        (self.timeout + self.retry_delay) * self.max_attempts.max(1)
    }
}

// =============================================================================
// Fetcher
// =============================================================================

pub struct StandingsFetcher<T> {
    transport: T,
    request: SourceRequest,
    policy: FetchPolicy,
}

impl<T: Transport> StandingsFetcher<T> {
    pub fn new(transport: T, request: SourceRequest, policy: FetchPolicy) -> Self {
        Self {
            transport,
            request,
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the raw standings payload.
    ///
    /// Malformed addresses and non-retryable responses fail immediately.
    /// Transient failures are retried after `retry_delay` until
    /// `max_attempts` attempts have been made.
    pub async fn fetch(&self) -> Result<RawDocument, StandingsError> {
        let url = self.request.url().map_err(StandingsError::SourceRejected)?;
        let headers = self.request.headers().map_err(StandingsError::SourceRejected)?;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!(url = %url, attempt, max_attempts, "Source request");

            let result = self
                .transport
                .get(&url, &headers, self.policy.timeout)
                .await
                .and_then(TransportResponse::into_body);

            match result {
                Ok(body) => {
                    info!(
                        attempt,
                        bytes = body.len(),
                        kind = %self.request.kind,
                        "Source fetched"
                    );
                    return Ok(RawDocument::new(self.request.kind, body));
                }
                Err(e) if !e.is_retryable() => {
                    warn!(error = %e, attempt, "Source request rejected, not retrying");
                    return Err(StandingsError::SourceRejected(e));
                }
                Err(e) => {
                    if attempt < max_attempts {
                        warn!(
                            error = %e,
                            attempt,
                            max_attempts,
                            delay_ms = self.policy.retry_delay.as_millis() as u64,
                            "Source fetch failed, retrying"
                        );
                        tokio::time::sleep(self.policy.retry_delay).await;
                    } else {
                        warn!(error = %e, attempt, "Source fetch failed, attempts exhausted");
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(StandingsError::SourceUnavailable {
            attempts: max_attempts,
            last_error: last_error
                .unwrap_or_else(|| FetchError::Network("no attempt made".to_string())),
        })
    }
}
