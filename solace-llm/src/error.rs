//! solace-llm error types
//!
//! Re-exports solace-error and maps provider failures onto it.

pub use solace_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        let kind = match &err {
            ProviderError::Network(_) => ErrorKind::NetworkFailed,
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            ProviderError::InvalidRequest(_) => ErrorKind::InvalidArgument,
            ProviderError::ModelNotFound(_) => ErrorKind::ConfigInvalid,
            ProviderError::Parse(_) => ErrorKind::ParseFailed,
            ProviderError::Api { status, .. } if *status >= 500 => ErrorKind::ProviderUnavailable,
            ProviderError::Api { .. } | ProviderError::Other(_) => ErrorKind::InferenceFailed,
        };

        let mut error = Error::new(kind, err.to_string()).with_operation("provider");
        if let ProviderError::Api { status, .. } = &err {
            error = error.with_context("http_status", status.to_string());
        }
        if let ProviderError::RateLimited { retry_after: Some(secs) } = &err {
            error = error.with_context("retry_after", secs.to_string());
        }
        error.set_source(err)
    }
}

/// The automation service could not be reached at all
pub fn automation_unreachable(base_url: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::NetworkFailed, reason)
        .with_context("automation_url", base_url)
        .temporary()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_mapping() {
        let err: Error = ProviderError::AuthenticationFailed.into();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(err.kind().is_configuration());

        let err: Error = ProviderError::RateLimited { retry_after: Some(7) }.into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
        assert_eq!(err.context_value("retry_after"), Some("7"));

        let err: Error = ProviderError::Api { status: 503, message: "overloaded".into() }.into();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert_eq!(err.context_value("http_status"), Some("503"));

        let err: Error = ProviderError::Api { status: 400, message: "bad".into() }.into();
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert!(err.source_ref().is_some());
    }
}
