//! Request pipeline for the PayRun REST API
//!
//! Every operation signs a fresh request, encodes the payload in the
//! configured content type, dispatches it through the retrying
//! [`HttpClient`] and decodes the response per the content type the server
//! actually returned.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use payrun_common::auth::generate_nonce;
use payrun_common::codec::Element;
use payrun_common::time::{Clock, SystemClock};
use payrun_common::{Codec, HmacSha1Signer, SignatureGenerator, SigningRequest, WireFormat};
use payrun_domain::constants::{
    API_VERSION_HEADER, CONTENT_TYPE_JSON, CONTENT_TYPE_XML, REVISION_DATE_FORMAT,
};
use payrun_domain::{
    ClientConfig, Credentials, EndpointConfig, Link, LinkCollection, PayRunError, Result,
};
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::error_body::rejection_message;
use super::resource::LinkedResource;
use crate::errors::IntoPayRunError;
use crate::http::{HttpClient, PreparedRequest, RawResponse, Transport};

/// Sentinel stored in `last_status` before the first response.
const NO_STATUS: u16 = 0;

/// Blocking client for the PayRun REST API.
///
/// One instance can be shared between threads. Apart from
/// [`ApiClient::last_status`], calls do not observe each other.
pub struct ApiClient {
    credentials: Credentials,
    endpoint: EndpointConfig,
    content_format: WireFormat,
    http: HttpClient,
    codec: Codec,
    signer: Arc<dyn SignatureGenerator>,
    clock: Arc<dyn Clock>,
    last_status: AtomicU16,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("content_format", &self.content_format)
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with the production transport, clock and signer.
    ///
    /// # Errors
    /// Returns `PayRunError::Config` when the configuration is invalid or
    /// names a content type or accept type the codec cannot handle.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for injecting collaborators.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Status code of the most recent response received by this client.
    ///
    /// Shared by every caller of the instance: under concurrent use the
    /// value may belong to another thread's call. Serialize calls on one
    /// client, or rely on the returned `Result`, when the status matters.
    pub fn last_status(&self) -> Option<u16> {
        match self.last_status.load(Ordering::Relaxed) {
            NO_STATUS => None,
            status => Some(status),
        }
    }

    /// Fetch the resource at `path` as `T`.
    ///
    /// # Errors
    /// - `PayRunError::ServerRejected` for a non-success status
    /// - `PayRunError::TransportExhausted` / `PayRunError::Transport` when
    ///   the exchange itself failed
    /// - `PayRunError::MalformedDocument` / `PayRunError::UnsupportedContentType`
    ///   when the body cannot be decoded into `T`
    #[instrument(skip(self), fields(method = "GET"))]
    pub fn get<T: DeserializeOwned + 'static>(&self, path: &str) -> Result<T> {
        let response = self.execute(Method::GET, path, &self.endpoint.accept, None)?;
        self.decode(&response, &self.endpoint.accept)
    }

    /// Fetch the revision of the resource at `path` effective on `date`.
    ///
    /// The date is appended as a `yyyy-MM-dd` segment after a trailing slash.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub fn get_at_revision<T: DeserializeOwned + 'static>(
        &self,
        path: &str,
        date: NaiveDate,
    ) -> Result<T> {
        self.get(&revision_path(path, date))
    }

    /// Fetch a link collection, e.g. the children of a collection resource.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub fn get_links(&self, path: &str) -> Result<LinkCollection> {
        self.get(path)
    }

    /// Follow `link` and decode it into the variant named by its type tag.
    ///
    /// Links without a `TargetType` are resolved by the root element name of
    /// the fetched document.
    ///
    /// # Errors
    /// Returns `PayRunError::MalformedDocument` for a tag outside `R`, plus
    /// the errors of [`ApiClient::get`].
    #[instrument(skip(self), fields(href = %link.href))]
    pub fn get_linked<R: LinkedResource>(&self, link: &Link) -> Result<R> {
        let response = self.execute(Method::GET, &link.href, &self.endpoint.accept, None)?;
        let document = self.decode_document(&response, &self.endpoint.accept)?;
        let target_type = link.target_type.as_deref().unwrap_or(&document.name);

        debug!(target_type, "resolving linked resource");
        R::from_document(&self.codec, target_type, &document)
    }

    /// Create a resource and return the link to it.
    ///
    /// # Errors
    /// Returns `PayRunError::Encoding` when `payload` cannot be written, plus
    /// the errors of [`ApiClient::get`].
    #[instrument(skip(self, payload), fields(method = "POST"))]
    pub fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<Link> {
        let body = self.encode(payload)?;
        let response = self.execute(Method::POST, path, &self.endpoint.accept, Some(body))?;
        self.decode(&response, &self.endpoint.accept)
    }

    /// Create several resources in one request.
    ///
    /// # Errors
    /// See [`ApiClient::post`].
    #[instrument(skip(self, payloads), fields(method = "POST", count = payloads.len()))]
    pub fn post_many<T: Serialize>(&self, path: &str, payloads: &[T]) -> Result<LinkCollection> {
        let body = self
            .codec
            .encode_many(payloads, self.content_format)
            .map_err(IntoPayRunError::into_payrun)?;
        let response = self.execute(Method::POST, path, &self.endpoint.accept, Some(body))?;
        self.decode(&response, &self.endpoint.accept)
    }

    /// Replace the resource at `path` and return the server's copy.
    ///
    /// # Errors
    /// See [`ApiClient::post`].
    #[instrument(skip(self, payload), fields(method = "PUT"))]
    pub fn put<T>(&self, path: &str, payload: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let body = self.encode(payload)?;
        let response = self.execute(Method::PUT, path, &self.endpoint.accept, Some(body))?;
        self.decode(&response, &self.endpoint.accept)
    }

    /// Apply a partial document to the resource at `path`.
    ///
    /// `document` is sent as-is, labelled with the configured content type.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    #[instrument(skip(self, document), fields(method = "PATCH", bytes = document.len()))]
    pub fn patch<T: DeserializeOwned + 'static>(&self, path: &str, document: &[u8]) -> Result<T> {
        let body = Some(document.to_vec());
        let response = self.execute(Method::PATCH, path, &self.endpoint.accept, body)?;
        self.decode(&response, &self.endpoint.accept)
    }

    /// Delete the resource at `path`. The response body is discarded.
    ///
    /// # Errors
    /// See [`ApiClient::get`], minus the decoding failures.
    #[instrument(skip(self), fields(method = "DELETE"))]
    pub fn delete(&self, path: &str) -> Result<()> {
        self.execute(Method::DELETE, path, &self.endpoint.accept, None).map(drop)
    }

    /// Fetch `path` requesting XML and return the unmapped document.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    #[instrument(skip(self), fields(method = "GET"))]
    pub fn get_raw_xml(&self, path: &str) -> Result<Element> {
        let response = self.execute(Method::GET, path, CONTENT_TYPE_XML, None)?;
        self.decode_document(&response, CONTENT_TYPE_XML)
    }

    /// Fetch `path` requesting JSON and return the body text verbatim.
    ///
    /// # Errors
    /// See [`ApiClient::get`], minus the decoding failures.
    #[instrument(skip(self), fields(method = "GET"))]
    pub fn get_raw_json(&self, path: &str) -> Result<String> {
        self.execute(Method::GET, path, CONTENT_TYPE_JSON, None)
            .map(|response| response.body_text())
    }

    /// Sign, send and classify one request.
    fn execute(
        &self,
        method: Method,
        path: &str,
        accept: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let url = self.resolve(path)?;
        let request = self.prepare(method, url, accept, body)?;
        let response = self.http.send(&request)?;

        self.last_status.store(response.status, Ordering::Relaxed);

        if response.is_success() {
            info!(method = %request.method, path, status = response.status, "request completed");
            return Ok(response);
        }

        let message = rejection_message(response.status, &response.body_text());
        let error = PayRunError::ServerRejected { status: response.status, message };
        warn!(
            method = %request.method,
            path,
            status = response.status,
            error = error.label(),
            "server rejected request"
        );
        Err(error)
    }

    fn prepare(
        &self,
        method: Method,
        url: Url,
        accept: &str,
        body: Option<Vec<u8>>,
    ) -> Result<PreparedRequest> {
        let nonce = generate_nonce();
        let signing = SigningRequest {
            method: method.as_str(),
            url: url.as_str(),
            consumer_key: &self.credentials.consumer_key,
            timestamp: self.clock.unix_timestamp(),
            nonce: &nonce,
        };
        let signature = self
            .signer
            .sign(&self.credentials.consumer_secret, &signing)
            .map_err(IntoPayRunError::into_payrun)?;
        let authorization = self.signer.auth_header(&signing, &signature);

        let mut request = PreparedRequest::new(method, url)
            .header(AUTHORIZATION, header_value("Authorization", &authorization)?)
            .header(ACCEPT, header_value("Accept", accept)?)
            .header(CONTENT_TYPE, header_value("Content-Type", &self.endpoint.content_type)?);

        if let Some(version) = &self.endpoint.api_version {
            let value = header_value(API_VERSION_HEADER, version)?;
            request = request.header(HeaderName::from_static("api-version"), value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request)
    }

    /// Absolute URL for `path`; absolute hrefs are used unchanged.
    fn resolve(&self, path: &str) -> Result<Url> {
        let target = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let base = self.endpoint.base_url.trim_end_matches('/');
            format!("{base}/{}", path.trim_start_matches('/'))
        };

        Url::parse(&target)
            .map_err(|e| PayRunError::Config(format!("invalid request url '{target}': {e}")))
    }

    fn encode<T: Serialize>(&self, payload: &T) -> Result<Vec<u8>> {
        self.codec.encode(payload, self.content_format).map_err(IntoPayRunError::into_payrun)
    }

    fn decode<T: DeserializeOwned + 'static>(
        &self,
        response: &RawResponse,
        requested: &str,
    ) -> Result<T> {
        let content_type = response.content_type.as_deref().unwrap_or(requested);
        self.codec.decode(&response.body, content_type).map_err(IntoPayRunError::into_payrun)
    }

    fn decode_document(&self, response: &RawResponse, requested: &str) -> Result<Element> {
        let content_type = response.content_type.as_deref().unwrap_or(requested);
        self.codec
            .decode_document(&response.body, content_type)
            .map_err(IntoPayRunError::into_payrun)
    }
}

/// `path` with a trailing slash and the `yyyy-MM-dd` date segment.
fn revision_path(path: &str, date: NaiveDate) -> String {
    let separator = if path.ends_with('/') { "" } else { "/" };
    format!("{path}{separator}{}", date.format(REVISION_DATE_FORMAT))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PayRunError::Config(format!("invalid {name} header value: {e}")))
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    signer: Option<Arc<dyn SignatureGenerator>>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the network transport (e.g. a proxying or stub transport).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Clock used for OAuth timestamps and backoff sleeps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn signer(mut self, signer: Arc<dyn SignatureGenerator>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Validate the configuration and assemble the client.
    ///
    /// # Errors
    /// Returns `PayRunError::Config` when no configuration was supplied, it
    /// fails validation, or its content type or accept type has no codec.
    pub fn build(self) -> Result<ApiClient> {
        let config = self
            .config
            .ok_or_else(|| PayRunError::Config("client configuration is required".into()))?;
        config.validate()?;

        let content_format = supported_format("content_type", &config.endpoint.content_type)?;
        supported_format("accept", &config.endpoint.accept)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let mut http = HttpClient::builder().retry(&config.retry).clock(Arc::clone(&clock));
        if let Some(transport) = self.transport {
            http = http.transport(transport);
        }

        debug!(
            base_url = %config.endpoint.base_url,
            content_type = %config.endpoint.content_type,
            accept = %config.endpoint.accept,
            max_attempts = config.retry.max_attempts,
            "building PayRun API client"
        );

        Ok(ApiClient {
            http: http.build()?,
            credentials: config.credentials,
            endpoint: config.endpoint,
            content_format,
            codec: Codec::new(),
            signer: self.signer.unwrap_or_else(|| Arc::new(HmacSha1Signer)),
            clock,
            last_status: AtomicU16::new(NO_STATUS),
        })
    }
}

fn supported_format(field: &str, media_type: &str) -> Result<WireFormat> {
    WireFormat::from_content_type(media_type).map_err(|_| {
        PayRunError::Config(format!(
            "{field} '{media_type}' is neither an XML nor a JSON media type"
        ))
    })
}
