//! Shared retry loop for every backend client.
//!
//! Each attempt's failure goes through [`classify`], and that classification
//! alone decides whether the loop backs off and tries again or stops.

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::context::RequestContext;
use super::response::{classify_html_error, is_html_page};
use crate::error::{Result, WarpError};

/// How a failed attempt is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Back off and try again
    Retryable,
    /// Credential rejected by status code; stop
    TerminalAuth,
    /// Request can't succeed as sent; stop
    TerminalClient,
    /// Caller cancelled or the deadline passed; stop
    Cancelled,
}

/// Why a single attempt failed
#[derive(Debug)]
pub enum AttemptError {
    /// Server answered with a non-success status
    Status { status: StatusCode, body: String },
    /// Request never completed (connect, DNS, read errors)
    Transport(reqwest::Error),
    /// The request context finished while the attempt was in flight
    Interrupted(WarpError),
}

impl AttemptError {
    fn into_error(self) -> WarpError {
        match self {
            Self::Status { status, body } => match status.as_u16() {
                401 | 403 => WarpError::AuthenticationFailed(format!("server returned status {}", status)),
                429 => WarpError::RateLimit,
                408 | 500..=599 => WarpError::ServerError(format!("Server returned status {}", status)),
                _ if is_html_page(&body) => classify_html_error(&body),
                code => WarpError::ClientError {
                    status: code,
                    message: snippet(&body, 200),
                },
            },
            Self::Transport(err) => WarpError::Network(err),
            Self::Interrupted(err) => err,
        }
    }
}

/// Classification of a non-success HTTP status
pub fn classify_status(status: StatusCode) -> Classification {
    match status.as_u16() {
        408 | 429 | 500 | 502 | 503 | 504 => Classification::Retryable,
        401 | 403 => Classification::TerminalAuth,
        _ => Classification::TerminalClient,
    }
}

pub fn classify(failure: &AttemptError) -> Classification {
    match failure {
        AttemptError::Status { status, .. } => classify_status(*status),
        AttemptError::Transport(_) => Classification::Retryable,
        AttemptError::Interrupted(_) => Classification::Cancelled,
    }
}

/// Attempt ceiling and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay slept before retry number `retry` (1 = first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds, fails terminally, or runs out of attempts.
///
/// The attempt number (starting at 1) is passed to `operation`. Both the
/// attempt and the backoff sleep are raced against `ctx`.
pub async fn retry_with_backoff<T, F, Fut>(
    ctx: &RequestContext,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            let delay = policy.delay_for(attempt - 1);
            debug!("Retrying in {:?} (attempt {}/{})", delay, attempt, max_attempts);
            ctx.sleep(delay).await?;
        }

        let failure = match ctx.run(operation(attempt)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(failure)) => failure,
            Err(err) => AttemptError::Interrupted(err),
        };

        match classify(&failure) {
            Classification::Retryable => {
                let err = failure.into_error();
                warn!("Attempt {}/{} failed: {}", attempt, max_attempts, err);
                last_error = Some(err);
            }
            Classification::TerminalAuth
            | Classification::TerminalClient
            | Classification::Cancelled => return Err(failure.into_error()),
        }
    }

    Err(WarpError::MaxRetriesExceeded {
        attempts: max_attempts,
        source: Box::new(
            last_error.unwrap_or_else(|| WarpError::Other("no attempt was made".to_string())),
        ),
    })
}

/// Response body captured from a successful attempt
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

/// GET `url` through the retry loop, reading the whole body inside each attempt
pub async fn fetch_with_retry(
    http: &Client,
    url: &Url,
    ctx: &RequestContext,
    policy: &RetryPolicy,
) -> Result<RawResponse> {
    let display_url = redacted(url);
    retry_with_backoff(ctx, policy, |attempt| {
        let request = http.get(url.clone());
        let display_url = display_url.clone();
        async move {
            debug!("GET {} (attempt {})", display_url, attempt);
            let response = request.send().await.map_err(AttemptError::Transport)?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.map_err(AttemptError::Transport)?;

            if status.is_success() {
                Ok(RawResponse {
                    status,
                    content_type,
                    body,
                })
            } else {
                Err(AttemptError::Status { status, body })
            }
        }
    })
    .await
}

/// URL with the `OC` credential masked, for logging
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "OC" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// First `max` characters of `text`, on one line
pub(crate) fn snippet(text: &str, max: usize) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max)
        .collect()
}
