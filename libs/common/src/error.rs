//! Error taxonomy for calls made against the board API
//!
//! Errors are classified once, at the gateway boundary. Downstream code
//! matches on the variant and never re-parses message strings.

use std::error::Error as StdError;

use thiserror::Error;

use crate::codes::{self, ErrorCode};

/// Boxed transport cause kept on [`ApiError::Unreachable`]
pub type TransportCause = Box<dyn StdError + Send + Sync + 'static>;

/// Failure of an API call
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response at all (connection refused, DNS, timeout)
    #[error("Server unreachable: {0}")]
    Unreachable(#[source] TransportCause),

    /// The access token could not be refreshed; the session was ended
    #[error("Authentication expired")]
    AuthenticationExpired,

    /// The submitted credentials were rejected (wrong email/password)
    #[error("{raw}")]
    CredentialRejected { code: ErrorCode, raw: String },

    /// Business error reported by the server with a domain code
    #[error("{raw}")]
    Domain {
        status: u16,
        code: ErrorCode,
        raw: String,
    },

    /// Error whose message carries no recognisable code
    #[error("{raw}")]
    Unclassified { status: Option<u16>, raw: String },
}

impl ApiError {
    /// Build a server-reported error from its status and raw message
    pub fn from_server(status: u16, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match ErrorCode::extract(&raw) {
            Some(code) => ApiError::Domain { status, code, raw },
            None => ApiError::Unclassified {
                status: Some(status),
                raw,
            },
        }
    }

    /// Error for a response body that could not be understood
    pub fn malformed(status: Option<u16>, detail: impl Into<String>) -> Self {
        ApiError::Unclassified {
            status,
            raw: detail.into(),
        }
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ApiError::CredentialRejected { code, .. } | ApiError::Domain { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the error carries the given domain code
    pub fn has_code(&self, code: &str) -> bool {
        self.code().is_some_and(|c| c.is(code))
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }

    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unreachable(_) => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            ApiError::AuthenticationExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiError::CredentialRejected { raw, .. } | ApiError::Domain { raw, .. } => {
                codes::translate(raw)
            }
            ApiError::Unclassified { raw, .. } => raw.clone(),
        }
    }
}

/// Type alias for Result with ApiError
pub type ApiResult<T> = Result<T, ApiError>;
