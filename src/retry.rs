//! Retry policies for driving a prepared request to completion.
//!
//! A [`Retrier`] owns the attempt loop: it invokes the transport, decides
//! whether a failure is worth another try, and waits between attempts. The
//! default policy is [`ExponentialBackoff`].

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use http::header::DATE;
use http::HeaderValue;
use rand::Rng;

use crate::transport::{PreparedRequest, Transport, TransportResponse};
use crate::Error;

/// Maximum number of transport invocations unless configured otherwise.
const DEFAULT_MAX_TRIES: u32 = 3;

/// Status codes that trigger an automatic retry unless configured otherwise.
const DEFAULT_RETRYABLE_CODES: [u16; 4] = [429, 500, 503, 504];

/// The result of one retry-driven dispatch.
///
/// `attempts` counts actual transport invocations, 1-based and never larger
/// than the policy's bound. `result` is the final attempt's outcome: a
/// response — whatever its status code, an exhausted retryable status
/// included — or the final attempt's error.
#[derive(Debug)]
pub struct RetryOutcome {
    /// Number of transport invocations performed.
    pub attempts: u32,
    /// The final attempt's response or error.
    pub result: Result<TransportResponse, Error>,
}

/// Drives a prepared request through the transport until success, an
/// unretryable failure, or attempt exhaustion.
///
/// Attempts within one dispatch are strictly sequential, and retry state
/// never carries over between dispatches.
#[async_trait]
pub trait Retrier: Send + Sync {
    /// Sends the request, retrying per the policy.
    async fn try_send(
        &self,
        transport: &dyn Transport,
        request: &mut PreparedRequest,
    ) -> RetryOutcome;
}

/// Retry policy with exponentially growing, optionally jittered delays.
///
/// An attempt is retried when the transport timed out or the response
/// status is in the retryable set. The delay before attempt `n + 1` is
/// `floor((2^n - 1) / 2)` seconds — 0, 1, 3, 7, 15, … — and, with jitter
/// enabled, is shifted by a uniformly random offset within ±25% of the
/// delay's growth since the previous attempt, so synchronized clients
/// spread out instead of stampeding.
///
/// # Examples
///
/// ```
/// use restive::ExponentialBackoff;
///
/// let retrier = ExponentialBackoff::new()
///     .with_max_tries(5)
///     .with_retryable_codes([429, 503])
///     .with_jitter(false);
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max_tries: u32,
    retryable_codes: Vec<u16>,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Creates the default policy: at most 3 tries, retrying on 429, 500,
    /// 503, and 504, with jitter enabled.
    pub fn new() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            retryable_codes: DEFAULT_RETRYABLE_CODES.to_vec(),
            jitter: true,
        }
    }

    /// Sets the maximum number of tries. Ignored when zero; 1 is the
    /// minimum.
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        if max_tries > 0 {
            self.max_tries = max_tries;
        }
        self
    }

    /// Sets the status codes that trigger a retry. Ignored when empty.
    pub fn with_retryable_codes(mut self, codes: impl Into<Vec<u16>>) -> Self {
        let codes = codes.into();
        if !codes.is_empty() {
            self.retryable_codes = codes;
        }
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Base backoff delay in seconds after the given attempt (1-based).
    fn backoff_delay(attempt: u32) -> i64 {
        (2i64.saturating_pow(attempt) - 1) / 2
    }

    /// Applies the jitter offset to a base delay. The offset is drawn from
    /// `[-j, +j)` with `j = floor(0.25 * (delay - previous_delay))`; when
    /// jitter is disabled or the growth is too small to shift, the base
    /// delay stands.
    fn jittered(&self, delay: i64, previous_delay: i64) -> i64 {
        if !self.jitter {
            return delay;
        }
        let max_jitter = ((delay - previous_delay) as f64 * 0.25) as i64;
        if max_jitter > 0 {
            delay + rand::thread_rng().gen_range(-max_jitter..max_jitter)
        } else {
            delay
        }
    }

    fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_codes.contains(&status)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retrier for ExponentialBackoff {
    async fn try_send(
        &self,
        transport: &dyn Transport,
        request: &mut PreparedRequest,
    ) -> RetryOutcome {
        let mut previous_delay: i64 = 0;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            stamp_date(request);

            tracing::debug!(
                attempt = attempts,
                method = %request.method,
                url = %request.url,
                "dispatching request"
            );
            let result = transport.send(request).await;

            let can_retry = match &result {
                Err(error) => error.is_timeout(),
                Ok(response) => self.is_retryable_status(response.status.as_u16()),
            };
            if !can_retry {
                return RetryOutcome { attempts, result };
            }
            if attempts >= self.max_tries {
                tracing::warn!(attempts, "retries exhausted");
                return RetryOutcome { attempts, result };
            }

            let delay = Self::backoff_delay(attempts);
            let wait = self.jittered(delay, previous_delay);
            previous_delay = delay;

            tracing::info!(
                attempt = attempts,
                wait_secs = wait,
                outcome = %describe(&result),
                "retrying after backoff"
            );
            tokio::time::sleep(Duration::from_secs(wait.max(0) as u64)).await;
        }
    }
}

/// Stamps the request with the current timestamp, refreshed on every
/// attempt.
fn stamp_date(request: &mut PreparedRequest) {
    let now = httpdate::fmt_http_date(SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&now) {
        request.headers.insert(DATE, value);
    }
}

fn describe(result: &Result<TransportResponse, Error>) -> String {
    match result {
        Ok(response) => format!("status {}", response.status.as_u16()),
        Err(error) => error.to_string(),
    }
}
