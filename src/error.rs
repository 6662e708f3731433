//! Error types
//!
//! Per-request failures travel as [`Error`] and are converted into a response by
//! the application's error handler. Setup and URL reversal failures are returned
//! directly to the caller and never become HTTP responses.

use hyper::StatusCode;
use thiserror::Error;

/// Result alias used by handlers and extensions
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure that carries an HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Error {}", .status.as_u16())]
pub struct HttpError {
    status: StatusCode,
}

impl HttpError {
    pub const fn new(status: StatusCode) -> Self {
        Self { status }
    }

    /// Build from a numeric status, falling back to 500 for codes outside 100..=999
    pub fn from_code(code: u16) -> Self {
        Self::new(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
    }

    pub const fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    pub const fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub const fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub const fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

/// Failure raised while handling a single request
#[derive(Debug, Error)]
pub enum Error {
    /// Aborts handling with a specific status
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Anything else; becomes a 500 at the dispatcher boundary
    #[error("{0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Internal(error.into())
    }

    /// Status carried by the failure, if any
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => Some(e.status()),
            Self::Internal(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::internal(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::internal(message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(error)
    }
}

/// Fatal problems detected while assembling an application
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("multiple error handlers supplied")]
    MultipleErrorHandlers,
    #[error("route name '{0}' is already registered")]
    DuplicateRouteName(String),
}

/// URL generation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReverseError {
    #[error("'{0}' is not a handler registered in the application")]
    UnknownHandler(String),
    #[error("handler '{name}' takes {expected} argument(s), {given} given")]
    ArgumentMismatch {
        name: String,
        expected: usize,
        given: usize,
    },
    #[error("argument '{value}' for handler '{name}' is not a single path segment")]
    InvalidArgument { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        assert_eq!(HttpError::not_found().to_string(), "Error 404");
        assert_eq!(HttpError::from_code(503).to_string(), "Error 503");

        let boxed: Box<dyn std::error::Error> = Box::new(HttpError::forbidden());
        assert_eq!(boxed.to_string(), "Error 403");
    }

    #[test]
    fn test_from_code_out_of_range() {
        assert_eq!(
            HttpError::from_code(42).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_status() {
        let err: Error = HttpError::forbidden().into();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

        let err: Error = "boom".into();
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "boom");
    }
}
