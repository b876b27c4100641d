//! Error types used throughout the client

use std::time::Duration;

use thiserror::Error;

/// Main error type for the PayRun client.
///
/// Every failure surfaced by the request pipeline is one of these variants.
/// None of them is retried by the caller-facing API: the only transient
/// condition (connection refused) is absorbed by the transport and only
/// escapes as [`PayRunError::TransportExhausted`] once the attempt ceiling is
/// reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayRunError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport exhausted after {attempts} attempts ({waited:?} spent waiting)")]
    TransportExhausted { attempts: u32, waited: Duration },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected request with HTTP {status}: {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl PayRunError {
    /// HTTP status attached to a server rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::TransportExhausted { .. } => "transport_exhausted",
            Self::Transport(_) => "transport",
            Self::ServerRejected { .. } => "server_rejected",
            Self::MalformedDocument(_) => "malformed_document",
            Self::UnsupportedContentType(_) => "unsupported_content_type",
            Self::Encoding(_) => "encoding",
        }
    }
}

/// Result type alias for PayRun operations
pub type Result<T> = std::result::Result<T, PayRunError>;
