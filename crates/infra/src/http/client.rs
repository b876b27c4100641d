use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use payrun_common::time::{Clock, SystemClock};
use payrun_domain::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, REQUEST_TIMEOUT,
};
use payrun_domain::{PayRunError, RetryConfig};
use tracing::{debug, error, warn};

use super::request::{PreparedRequest, RawResponse};
use super::transport::{ReqwestTransport, Transport};

/// HTTP client that retries refused connections with exponential backoff.
///
/// Every other failure, and every HTTP status, is returned after the first
/// attempt.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_attempts", &self.max_attempts)
            .field("base_backoff", &self.base_backoff)
            .field("max_backoff", &self.max_backoff)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, PayRunError> {
        Self::builder().build()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Execute `request`, retrying while the connection is refused.
    ///
    /// # Errors
    /// - `PayRunError::TransportExhausted` once `max_attempts` refused
    ///   attempts have been made, carrying the total time slept
    /// - `PayRunError::Transport` for any other transport failure
    pub fn send(&self, request: &PreparedRequest) -> Result<RawResponse, PayRunError> {
        let attempts = self.max_attempts.max(1);
        let mut waited = Duration::ZERO;
        let mut current = Cow::Borrowed(request);

        for attempt in 1..=attempts {
            let method = &current.method;
            let url = &current.url;
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.transport.execute(&current) {
                Ok(response) => {
                    let status = response.status;
                    debug!(attempt, %method, %url, status, "received HTTP response");
                    return Ok(response);
                }
                Err(err) if err.is_connection_refused() => {
                    if attempt == attempts {
                        break;
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt,
                        %method,
                        %url,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "connection refused; retrying"
                    );
                    if !delay.is_zero() {
                        self.clock.sleep(delay);
                    }
                    waited += delay;

                    // A request that carried a body is rebuilt rather than resent
                    if current.body.is_some() {
                        current = Cow::Owned(current.reconstruct());
                    }
                }
                Err(err) => {
                    warn!(attempt, %method, %url, error = %err, "HTTP request failed");
                    return Err(PayRunError::Transport(err.message));
                }
            }
        }

        error!(
            attempts,
            waited_ms = waited.as_millis() as u64,
            url = %request.url,
            "connection refused on every attempt; giving up"
        );
        Err(PayRunError::TransportExhausted { attempts, waited })
    }

    /// Delay before retry `retry_number` (1-based): the base doubled for each
    /// earlier retry, capped at the maximum.
    fn backoff_delay(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(16);
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier).min(self.max_backoff)
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_DELAY,
            max_backoff: DEFAULT_MAX_DELAY,
            transport: None,
            clock: None,
        }
    }
}

impl HttpClientBuilder {
    /// Timeout for the default reqwest transport. Ignored when a transport
    /// is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Apply attempt ceiling and backoff range from configuration.
    pub fn retry(self, retry: &RetryConfig) -> Self {
        self.max_attempts(retry.max_attempts)
            .base_backoff(retry.base_delay())
            .max_backoff(retry.max_delay())
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<HttpClient, PayRunError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_timeout(self.timeout)?),
        };

        Ok(HttpClient {
            transport,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
            max_backoff: self.max_backoff.max(self.base_backoff),
        })
    }
}
