//! Conversions from external infrastructure errors into domain errors.

use payrun_common::CommonError;
use payrun_domain::PayRunError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PayRunError);

impl From<InfraError> for PayRunError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PayRunError> for InfraError {
    fn from(value: PayRunError) -> Self {
        InfraError(value)
    }
}

/// Explicit conversion into [`PayRunError`] for foreign error types.
pub trait IntoPayRunError {
    fn into_payrun(self) -> PayRunError;
}

/* -------------------------------------------------------------------------- */
/* CommonError → PayRunError */
/* -------------------------------------------------------------------------- */

impl IntoPayRunError for CommonError {
    fn into_payrun(self) -> PayRunError {
        let message = self.to_string();
        match self {
            CommonError::Config { .. } => PayRunError::Config(message),
            CommonError::MalformedDocument { .. } => PayRunError::MalformedDocument(message),
            CommonError::UnsupportedContentType { content_type } => {
                PayRunError::UnsupportedContentType(content_type)
            }
            CommonError::Encoding { .. } => PayRunError::Encoding(message),
        }
    }
}

impl From<CommonError> for InfraError {
    fn from(value: CommonError) -> Self {
        InfraError(value.into_payrun())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PayRunError */
/* -------------------------------------------------------------------------- */

impl IntoPayRunError for HttpError {
    fn into_payrun(self) -> PayRunError {
        if self.is_builder() {
            return PayRunError::Config(format!("invalid HTTP request: {self}"));
        }
        if self.is_timeout() {
            return PayRunError::Transport("HTTP request timed out".into());
        }
        if self.is_connect() {
            let chain = error_chain(&self);
            return PayRunError::Transport(format!("HTTP connection failure: {chain}"));
        }
        if self.is_decode() || self.is_body() {
            return PayRunError::Transport(format!("failed to read HTTP response body: {self}"));
        }

        PayRunError::Transport(error_chain(&self))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_payrun())
    }
}

/// Display of an error followed by each of its sources.
pub(crate) fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
