//! Request and response values exchanged with a [`Transport`](super::Transport)

use std::time::Duration;

use payrun_domain::constants::REQUEST_TIMEOUT;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

/// Fully prepared outbound request. The body is buffered so the request can
/// be rebuilt for another attempt. Every request carries the fixed
/// [`REQUEST_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl PreparedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None, timeout: REQUEST_TIMEOUT }
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Equivalent request for a new attempt: same method, target, payload
    /// and headers, minus the ones the transport recomputes per send.
    pub fn reconstruct(&self) -> Self {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            if !is_recomputed(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body: self.body.clone(),
            timeout: self.timeout,
        }
    }
}

/// Hop-by-hop and per-send headers.
fn is_recomputed(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "content-length"
            | "transfer-encoding"
            | "date"
            | "connection"
            | "keep-alive"
            | "proxy-connection"
            | "host"
            | "te"
            | "trailer"
            | "upgrade"
    )
}

/// Completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, DATE};

    use super::*;

    fn post_request() -> PreparedRequest {
        let url = Url::parse("https://api.test.payrun.io/Employer").unwrap();
        PreparedRequest::new(Method::POST, url)
            .header(AUTHORIZATION, HeaderValue::from_static("OAuth oauth_consumer_key=\"key\""))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
            .header(CONTENT_LENGTH, HeaderValue::from_static("24"))
            .header(DATE, HeaderValue::from_static("Mon, 01 Jan 2024 00:00:00 GMT"))
            .header(CONNECTION, HeaderValue::from_static("keep-alive"))
            .header(HeaderName::from_static("api-version"), HeaderValue::from_static("18.19.1.481"))
            .body(b"<Employer Name=\"Acme\" />".to_vec())
    }

    #[test]
    fn reconstruct_keeps_payload_and_semantic_headers() {
        let original = post_request();
        let rebuilt = original.reconstruct();

        assert_eq!(rebuilt.method, Method::POST);
        assert_eq!(rebuilt.url, original.url);
        assert_eq!(rebuilt.body, original.body);
        assert_eq!(rebuilt.timeout, REQUEST_TIMEOUT);
        assert_eq!(rebuilt.headers.get(AUTHORIZATION), original.headers.get(AUTHORIZATION));
        assert_eq!(rebuilt.headers.get(CONTENT_TYPE), original.headers.get(CONTENT_TYPE));
        assert_eq!(rebuilt.headers.get("api-version").unwrap(), "18.19.1.481");
    }

    #[test]
    fn reconstruct_drops_recomputed_headers() {
        let rebuilt = post_request().reconstruct();

        assert!(rebuilt.headers.get(CONTENT_LENGTH).is_none());
        assert!(rebuilt.headers.get(DATE).is_none());
        assert!(rebuilt.headers.get(CONNECTION).is_none());
        assert_eq!(rebuilt.headers.len(), 3);
    }

    #[test]
    fn success_range_is_2xx() {
        let response = |status| RawResponse { status, content_type: None, body: Vec::new() };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(302).is_success());
        assert!(!response(400).is_success());
    }
}
