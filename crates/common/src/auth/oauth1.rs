//! OAuth1 signature generation
//!
//! Builds the signature base string from the HTTP method, the normalized
//! request URL and the sorted protocol and query parameters, then signs it
//! with HMAC-SHA1 keyed by `enc(consumer_secret)&`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::error::{CommonError, CommonResult};

type HmacSha1 = Hmac<Sha1>;

pub const OAUTH_SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Facts about one outbound request that the signature covers.
///
/// `url` must be the absolute URL that is actually sent. `nonce` and
/// `timestamp` must be fresh for every request.
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub consumer_key: &'a str,
    pub timestamp: u64,
    pub nonce: &'a str,
}

/// Produces OAuth1 signatures and `Authorization` header values.
pub trait SignatureGenerator: Send + Sync {
    /// Compute the base64 signature for `request`.
    ///
    /// # Errors
    /// Returns `CommonError::Config` when the consumer key or secret is
    /// empty, and `CommonError::MalformedDocument` when the URL cannot be
    /// parsed.
    fn sign(&self, consumer_secret: &str, request: &SigningRequest<'_>) -> CommonResult<String>;

    /// Compose the `Authorization` header value for a signed request.
    fn auth_header(&self, request: &SigningRequest<'_>, signature: &str) -> String {
        build_auth_header(request.consumer_key, request.timestamp, request.nonce, signature)
    }
}

/// HMAC-SHA1 signer
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1Signer;

impl SignatureGenerator for HmacSha1Signer {
    fn sign(&self, consumer_secret: &str, request: &SigningRequest<'_>) -> CommonResult<String> {
        if request.consumer_key.is_empty() {
            return Err(CommonError::config_field("consumer_key", "must not be empty"));
        }
        if consumer_secret.is_empty() {
            return Err(CommonError::config_field("consumer_secret", "must not be empty"));
        }

        let base = signature_base_string(request)?;
        let key = format!("{}&", percent_encode(consumer_secret));

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| CommonError::config(format!("invalid signing key: {e}")))?;
        mac.update(base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `OAuth` header listing the protocol parameters, comma separated and
/// percent-encoded.
pub fn build_auth_header(
    consumer_key: &str,
    timestamp: u64,
    nonce: &str,
    signature: &str,
) -> String {
    format!(
        "OAuth oauth_consumer_key=\"{}\",oauth_signature_method=\"{}\",oauth_timestamp=\"{}\",oauth_nonce=\"{}\",oauth_version=\"{}\",oauth_signature=\"{}\"",
        percent_encode(consumer_key),
        OAUTH_SIGNATURE_METHOD,
        timestamp,
        percent_encode(nonce),
        OAUTH_VERSION,
        percent_encode(signature),
    )
}

/// Random single-use token: 32 bytes, URL-safe base64 without padding.
pub fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

fn signature_base_string(request: &SigningRequest<'_>) -> CommonResult<String> {
    let url = Url::parse(request.url)
        .map_err(|e| CommonError::malformed_format("URL", format!("{}: {e}", request.url)))?;

    let timestamp = request.timestamp.to_string();
    let mut params: Vec<(String, String)> = vec![
        (percent_encode("oauth_consumer_key"), percent_encode(request.consumer_key)),
        (percent_encode("oauth_nonce"), percent_encode(request.nonce)),
        (percent_encode("oauth_signature_method"), percent_encode(OAUTH_SIGNATURE_METHOD)),
        (percent_encode("oauth_timestamp"), percent_encode(&timestamp)),
        (percent_encode("oauth_version"), percent_encode(OAUTH_VERSION)),
    ];
    params.extend(url.query_pairs().map(|(k, v)| (percent_encode(&k), percent_encode(&v))));
    params.sort();

    let param_string =
        params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    Ok(format!(
        "{}&{}&{}",
        request.method.to_ascii_uppercase(),
        percent_encode(&normalized_url(&url)),
        percent_encode(&param_string)
    ))
}

/// Scheme, host and non-default port in lowercase, followed by the path.
/// Query and fragment are excluded.
fn normalized_url(url: &Url) -> String {
    let mut normalized = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    // `Url` already drops the scheme's default port
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{port}"));
    }
    normalized.push_str(url.path());
    normalized
}

/// RFC 3986 encoding: everything except `A-Z a-z 0-9 - . _ ~`.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
