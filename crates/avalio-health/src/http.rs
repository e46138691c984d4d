//! HTTP resource — `HEAD` request, expected status, fixed-delay retries.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::debug;

use avalio_core::CheckDetail;
use avalio_core::config::{
    DEFAULT_HTTP_MAX_ATTEMPTS, DEFAULT_HTTP_RETRY_DELAY, DEFAULT_REQUEST_TIMEOUT,
    HttpResourceConfig,
};

use crate::error::{ResourceError, ResourceResult};
use crate::resource::{CheckOutcome, Resource};

pub struct HttpResource {
    name: String,
    url: Url,
    expected_status: StatusCode,
    max_attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpResource {
    /// Create a resource with default retry policy and timeout.
    pub fn new(name: &str, url: &str, expected_status: u16) -> ResourceResult<Self> {
        let url = Url::parse(url).map_err(|e| ResourceError::InvalidParameter {
            name: name.to_string(),
            reason: format!("url {url:?}: {e}"),
        })?;
        let expected_status =
            StatusCode::from_u16(expected_status).map_err(|e| ResourceError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected_status {expected_status}: {e}"),
            })?;

        Ok(Self {
            name: name.to_string(),
            url,
            expected_status,
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            retry_delay: DEFAULT_HTTP_RETRY_DELAY,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            client: build_client(name, DEFAULT_REQUEST_TIMEOUT)?,
        })
    }

    pub fn from_config(config: &HttpResourceConfig) -> ResourceResult<Self> {
        Self::new(&config.name, &config.url, config.expected_status)?
            .with_retries(config.max_attempts(), config.retry_delay()?)
            .with_timeout(config.timeout()?)
    }

    /// Total attempts per check (at least one) and the pause between them.
    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Per-attempt request timeout. Must be non-zero.
    pub fn with_timeout(mut self, timeout: Duration) -> ResourceResult<Self> {
        if timeout.is_zero() {
            return Err(ResourceError::InvalidParameter {
                name: self.name,
                reason: "timeout must be positive".to_string(),
            });
        }
        self.client = build_client(&self.name, timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn attempt(&self) -> CheckOutcome {
        match self.client.head(self.url.clone()).send().await {
            Ok(resp) if resp.status() == self.expected_status => CheckOutcome::ok(),
            Ok(resp) => {
                debug!(resource = %self.name, status = %resp.status(), "unexpected response status");
                CheckOutcome::failed(vec![
                    CheckDetail::new("reason", "unexpected response status"),
                    CheckDetail::new("status", resp.status().as_u16().to_string()),
                    CheckDetail::new("expected status", self.expected_status.as_u16().to_string()),
                ])
            }
            Err(e) if e.is_timeout() => {
                debug!(resource = %self.name, url = %self.url, "http check timed out");
                CheckOutcome::failed(vec![
                    CheckDetail::new("reason", "request timed out"),
                    CheckDetail::new("timeout", format!("{:?}", self.timeout)),
                ])
            }
            Err(e) => {
                debug!(resource = %self.name, error = %e, "http check connection failed");
                CheckOutcome::failed(vec![
                    CheckDetail::new("reason", "connection error"),
                    CheckDetail::new("error", error_chain(&e)),
                ])
            }
        }
    }
}

#[async_trait]
impl Resource for HttpResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "http"
    }

    async fn check(&self) -> CheckOutcome {
        let mut attempt = 1;
        loop {
            let outcome = self.attempt().await;
            if outcome.ok || attempt >= self.max_attempts {
                return outcome;
            }
            debug!(
                resource = %self.name,
                attempt,
                max_attempts = self.max_attempts,
                "http check failed, retrying"
            );
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

fn build_client(name: &str, timeout: Duration) -> ResourceResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("avalio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ResourceError::Client {
            name: name.to_string(),
            source,
        })
}

/// `reqwest` puts the useful part (refused, DNS) in the source chain.
fn error_chain(e: &reqwest::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
