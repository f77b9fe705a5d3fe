//! Error types for the delivery API client.
//!
//! # Design
//! `ApiError` describes what went wrong with one HTTP exchange. `NotFound`
//! gets a dedicated variant because screens distinguish "the delivery does
//! not exist" from "the server returned an unexpected status."
//!
//! `SyncError` is what the synchronization operations return: it names the
//! operation that failed and keeps the underlying `ApiError` as its source,
//! so a caller can show "unable to update package" and still branch on the
//! failure kind.

use std::fmt;

use thiserror::Error;

/// Errors from building, executing, or parsing a single request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP round-trip itself failed (connection refused, DNS, broken body).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body does not match the expected schema.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The token store could not be read or written.
    #[error("token store: {0}")]
    TokenStore(String),
}

impl ApiError {
    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// The named synchronization operations, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Logout,
    ListDeliveries,
    GetDelivery,
    GetBusiness,
    GetCustomer,
    GetPackages,
    SetPackageStatus,
    CompleteDelivery,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Login => "login",
            Operation::Logout => "logout",
            Operation::ListDeliveries => "fetch deliveries",
            Operation::GetDelivery => "fetch delivery",
            Operation::GetBusiness => "fetch business",
            Operation::GetCustomer => "fetch customer",
            Operation::GetPackages => "fetch packages",
            Operation::SetPackageStatus => "update package",
            Operation::CompleteDelivery => "complete delivery",
        };
        f.write_str(name)
    }
}

/// Errors returned by `DeliveryService` operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Login failed. Transport, status, and decode failures all collapse
    /// into this one user-facing message.
    #[error("unable to login")]
    Authentication(#[source] ApiError),

    /// Any other operation failed.
    #[error("unable to {operation}")]
    Operation {
        operation: Operation,
        #[source]
        source: ApiError,
    },
}

impl SyncError {
    pub(crate) fn during(operation: Operation) -> impl FnOnce(ApiError) -> SyncError {
        move |source| SyncError::Operation { operation, source }
    }

    pub fn operation(&self) -> Operation {
        match self {
            SyncError::Authentication(_) => Operation::Login,
            SyncError::Operation { operation, .. } => *operation,
        }
    }

    /// The underlying failure, for callers that branch on its kind.
    pub fn api_error(&self) -> &ApiError {
        match self {
            SyncError::Authentication(source) => source,
            SyncError::Operation { source, .. } => source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.api_error(), ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn operation_errors_name_the_operation() {
        let err = SyncError::during(Operation::SetPackageStatus)(ApiError::NotFound);
        assert_eq!(err.to_string(), "unable to update package");
        assert_eq!(err.operation(), Operation::SetPackageStatus);
        assert!(err.is_not_found());
        assert_eq!(err.source().unwrap().to_string(), "resource not found");
    }

    #[test]
    fn authentication_hides_the_transport_detail() {
        let err = SyncError::Authentication(ApiError::HttpError {
            status: 401,
            body: "bad credentials".to_string(),
        });
        assert_eq!(err.to_string(), "unable to login");
        assert!(err.api_error().is_unauthorized());
        assert_eq!(err.operation(), Operation::Login);
    }

    #[test]
    fn status_is_only_known_for_server_answers() {
        assert_eq!(ApiError::NotFound.status(), Some(404));
        assert_eq!(ApiError::Transport("refused".into()).status(), None);
        assert_eq!(ApiError::DeserializationError("x".into()).status(), None);
    }
}
