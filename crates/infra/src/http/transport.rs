//! Single-attempt HTTP exchange

use std::error::Error as StdError;
use std::io::ErrorKind;
use std::time::Duration;

use payrun_domain::constants::REQUEST_TIMEOUT;
use payrun_domain::PayRunError;
use reqwest::blocking::Client as BlockingClient;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use super::request::{PreparedRequest, RawResponse};
use crate::errors::conversions::error_chain;
use crate::errors::InfraError;

/// How a failed attempt should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The remote endpoint actively refused the connection.
    ConnectionRefused,
    /// Anything else: DNS, TLS, timeouts, resets, unreadable bodies.
    Fatal,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn refused(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::ConnectionRefused, message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::Fatal, message: message.into() }
    }

    pub fn is_connection_refused(&self) -> bool {
        self.kind == TransportErrorKind::ConnectionRefused
    }
}

/// Performs exactly one network exchange. Any HTTP status counts as a
/// completed exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;
}

/// Blocking reqwest transport with gzip/deflate response decompression.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: BlockingClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, PayRunError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, PayRunError> {
        let client = BlockingClient::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .no_proxy()
            .build()
            .map_err(|err| PayRunError::from(InfraError::from(err)))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|err| classify(&err))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|err| {
                TransportError::fatal(format!(
                    "failed to read response body: {}",
                    error_chain(&err)
                ))
            })?
            .to_vec();

        Ok(RawResponse { status, content_type, body })
    }
}

fn classify(error: &reqwest::Error) -> TransportError {
    let message = error_chain(error);
    if is_connection_refused(error)
        || (error.is_connect() && message.to_ascii_lowercase().contains("refused"))
    {
        TransportError::refused(message)
    } else {
        TransportError::fatal(message)
    }
}

/// Walk the source chain looking for an I/O error of kind
/// `ConnectionRefused`.
fn is_connection_refused(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = err.source();
    }
    false
}
