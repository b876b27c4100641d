//! Common error type for the pure utilities in this crate
//!
//! Codec and signing helpers never perform I/O, so the failure space is
//! small: a document that cannot be read, a media type that has no codec,
//! a value that cannot be written, or a signer constructed from unusable
//! credentials. The infrastructure crate converts these into the caller
//! facing `PayRunError`.
//!
//! ```rust,ignore
//! use payrun_common::error::{CommonError, CommonResult};
//!
//! fn parse(bytes: &[u8]) -> CommonResult<Element> {
//!     xml::parse(bytes).map_err(|e| CommonError::malformed_format("XML", e.to_string()))
//! }
//! ```

use std::fmt;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by codec and signing helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Configuration-related errors (e.g. empty signing credentials)
    Config { message: String, field: Option<String> },

    /// Input that is not a well-formed document, or whose root element does
    /// not match the requested type
    MalformedDocument { message: String, format: Option<String> },

    /// Media type with no registered codec
    UnsupportedContentType { content_type: String },

    /// A value that could not be encoded
    Encoding { message: String, format: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::MalformedDocument { message, format } => {
                if let Some(format) = format {
                    write!(f, "Malformed {} document: {}", format, message)
                } else {
                    write!(f, "Malformed document: {}", message)
                }
            }
            Self::UnsupportedContentType { content_type } => {
                write!(f, "Unsupported content type: {}", content_type)
            }
            Self::Encoding { message, format } => {
                if let Some(format) = format {
                    write!(f, "{} encoding error: {}", format, message)
                } else {
                    write!(f, "Encoding error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl CommonError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedDocument { message: message.into(), format: None }
    }

    /// Create a malformed-document error tagged with the wire format
    pub fn malformed_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::MalformedDocument { message: message.into(), format: Some(format.into()) }
    }

    pub fn unsupported_content_type<S: Into<String>>(content_type: S) -> Self {
        Self::UnsupportedContentType { content_type: content_type.into() }
    }

    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding { message: message.into(), format: None }
    }

    /// Create an encoding error tagged with the wire format
    pub fn encoding_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Encoding { message: message.into(), format: Some(format.into()) }
    }

    /// Stable label for structured logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::MalformedDocument { .. } => "malformed_document",
            Self::UnsupportedContentType { .. } => "unsupported_content_type",
            Self::Encoding { .. } => "encoding",
        }
    }
}
