//! Content-type dispatch

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CommonError, CommonResult};

static XML_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)application/xml|text/xml|application/vnd\.[^;]+\+xml")
        .expect("XML_CONTENT should compile - this is a bug")
});

static JSON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)application/json|text/json|application/vnd\.[^;]+\+json")
        .expect("JSON_CONTENT should compile - this is a bug")
});

/// Wire syntax of a request or response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Xml,
    Json,
}

impl WireFormat {
    /// Classify a `Content-Type` header value. XML families are checked
    /// first.
    ///
    /// # Errors
    /// Returns `CommonError::UnsupportedContentType` when neither family
    /// matches.
    pub fn from_content_type(content_type: &str) -> CommonResult<Self> {
        if XML_CONTENT.is_match(content_type) {
            Ok(Self::Xml)
        } else if JSON_CONTENT.is_match(content_type) {
            Ok(Self::Json)
        } else {
            Err(CommonError::unsupported_content_type(content_type))
        }
    }

    /// Canonical media type for this format.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("XML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}
