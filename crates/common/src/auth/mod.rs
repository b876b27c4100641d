//! Request authentication
//!
//! Two-legged OAuth1 (HMAC-SHA1) signing: consumer credentials only, no
//! resource-owner token.

pub mod oauth1;

pub use oauth1::{
    build_auth_header, generate_nonce, HmacSha1Signer, SignatureGenerator, SigningRequest,
    OAUTH_SIGNATURE_METHOD, OAUTH_VERSION,
};
