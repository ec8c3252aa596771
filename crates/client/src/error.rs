//! Error taxonomy of the client.
//!
//! Transport failures ([`ClientError::Network`], [`ClientError::Timeout`])
//! are only surfaced after retries and the fallback are exhausted.
//! [`ClientError::Http`] is surfaced immediately and carries the decoded
//! [`ApiErrorCode`] next to the raw body.

use std::time::Duration;

use chefbot_core::api_error::{self, ApiErrorCode, RecoveryAction};
use chefbot_core::error::CoreError;

/// Errors returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, DNS, or TLS failure.
    #[error("Network error: {0}")]
    Network(String),

    /// A single attempt exceeded its deadline.
    #[error("Request to {url} timed out after {}s", after.as_secs_f64())]
    Timeout { url: String, after: Duration },

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}, {code}): {body}")]
    Http {
        status: u16,
        code: ApiErrorCode,
        /// `detail` message extracted from the body, if any.
        detail: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// No refresh token, or the backend rejected it.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A 2xx body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Build an [`ClientError::Http`] by classifying the status and body.
    pub fn from_response(status: u16, body: String) -> Self {
        let (code, detail) = api_error::classify(status, &body);
        Self::Http {
            status,
            code,
            detail,
            body,
        }
    }

    /// Structured code of an HTTP failure.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            Self::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// HTTP status of an HTTP failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The recovery a front end should offer for this failure.
    ///
    /// Transport failures suggest retrying; a dead session suggests
    /// signing in again.
    pub fn suggested_action(&self) -> Option<RecoveryAction> {
        match self {
            Self::Http { code, .. } => code.suggested_action(),
            Self::Network(_) | Self::Timeout { .. } => Some(RecoveryAction::RetryLater),
            Self::Auth(_) => Some(RecoveryAction::Reauthenticate),
            _ => None,
        }
    }

    /// Whether the engine may retry the attempt that produced this error.
    ///
    /// Only transport failures are retried; a status code is the server's
    /// final answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    /// Whether the backend no longer accepts the session's credentials.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Http { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_is_classified_once() {
        let err = ClientError::from_response(409, r#"{"detail":"Email already registered"}"#.into());
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.api_code(), Some(ApiErrorCode::EmailAlreadyRegistered));
        assert_eq!(err.suggested_action(), Some(RecoveryAction::SwitchToLogin));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("EMAIL_ALREADY_REGISTERED"));
    }

    #[test]
    fn transport_errors_are_transient() {
        assert!(ClientError::Network("refused".into()).is_transient());
        let timeout = ClientError::Timeout {
            url: "http://x/api".into(),
            after: Duration::from_secs(30),
        };
        assert!(timeout.is_transient());
        assert_eq!(timeout.to_string(), "Request to http://x/api timed out after 30s");
        assert_eq!(timeout.suggested_action(), Some(RecoveryAction::RetryLater));
    }

    #[test]
    fn auth_rejections() {
        assert!(ClientError::Auth("no refresh token".into()).is_auth_rejection());
        assert!(ClientError::from_response(401, r#"{"detail":"Invalid refresh token"}"#.into())
            .is_auth_rejection());
        assert!(
            ClientError::from_response(401, r#"{"detail":"Could not validate credentials"}"#.into())
                .is_auth_rejection()
        );
        assert!(!ClientError::from_response(500, "boom".into()).is_auth_rejection());
    }

    #[test]
    fn validation_wraps_core_error() {
        let err: ClientError = CoreError::Validation("Email must not be empty".into()).into();
        assert_eq!(err.to_string(), "Validation failed: Email must not be empty");
        assert_eq!(err.suggested_action(), None);
    }
}
