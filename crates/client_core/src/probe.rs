//! Existence probing: one HEAD request per attempt, retried with a linear backoff.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::domain::LookupOutcome;
use tracing::{debug, info, warn};

use crate::{config::ApiConfig, error::LookupError};

/// Delay unit for retries: retry `n` waits `n * BACKOFF_STEP`.
pub const BACKOFF_STEP: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAttempt {
    Available { status: u16 },
    Unavailable { status: u16 },
    TimedOut,
    Transport(String),
}

impl fmt::Display for ProbeAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeAttempt::Available { status } => write!(f, "available (HTTP {status})"),
            ProbeAttempt::Unavailable { status } => write!(f, "HTTP {status}"),
            ProbeAttempt::TimedOut => f.write_str("timed out"),
            ProbeAttempt::Transport(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Makes exactly one attempt. Failures are values, never errors.
    async fn probe(&self, url: &str) -> ProbeAttempt;
}

pub fn build_http_client() -> Result<Client, LookupError> {
    Client::builder()
        .user_agent(concat!("certlookup/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LookupError::HttpClient)
}

pub struct HttpProbe {
    http: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl ExistenceProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeAttempt {
        // Dropping the send future on timeout aborts the request.
        match tokio::time::timeout(self.timeout, self.http.head(url).send()).await {
            Err(_) => ProbeAttempt::TimedOut,
            Ok(Err(err)) if err.is_timeout() => ProbeAttempt::TimedOut,
            Ok(Err(err)) => ProbeAttempt::Transport(err.to_string()),
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() {
                    ProbeAttempt::Available {
                        status: status.as_u16(),
                    }
                } else {
                    ProbeAttempt::Unavailable {
                        status: status.as_u16(),
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is this plus one.
    pub retry_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: crate::config::DEFAULT_RETRY_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            retry_attempts: config.retry_attempts,
            ..Self::default()
        }
    }

    /// Linear, not exponential: retry 1 waits one step, retry 3 waits three.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }
}

pub struct ExistenceChecker<P> {
    probe: P,
    policy: RetryPolicy,
}

impl<P: ExistenceProbe> ExistenceChecker<P> {
    pub fn new(probe: P, policy: RetryPolicy) -> Self {
        Self { probe, policy }
    }

    /// Probes `url` until it is available or the retry budget is spent.
    ///
    /// Never fails: an exhausted budget resolves to `NotFound` when the last
    /// attempt got an HTTP answer and `NetworkError` when it did not.
    pub async fn check_exists(&self, url: &str) -> LookupOutcome {
        let mut retries = 0;
        loop {
            let attempt = retries + 1;
            let result = self.probe.probe(url).await;
            if let ProbeAttempt::Available { status } = result {
                debug!(url, attempt, status, "existence probe succeeded");
                return LookupOutcome::Found {
                    pdf_url: url.to_string(),
                    attempts: attempt,
                };
            }

            warn!(url, attempt, failure = %result, "existence probe failed");
            if retries >= self.policy.retry_attempts {
                return match result {
                    ProbeAttempt::Unavailable { .. } => LookupOutcome::NotFound { attempts: attempt },
                    _ => LookupOutcome::NetworkError { attempts: attempt },
                };
            }

            retries += 1;
            let delay = self.policy.delay_before_retry(retries);
            info!(
                url,
                retry = retries,
                max_retries = self.policy.retry_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying existence probe"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
#[path = "tests/probe_tests.rs"]
mod tests;
