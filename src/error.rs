//! Error handling for librocketchat
//!
//! This module provides error types and FFI-compatible error handling mechanisms.

use std::fmt;
use std::sync::Mutex;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes for FFI
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Operation succeeded
    Success = 0,
    /// Generic/unknown error
    Unknown = 1,
    /// Invalid argument provided
    InvalidArgument = 2,
    /// Null pointer was passed
    NullPointer = 3,
    /// Memory allocation failed
    OutOfMemory = 4,
    /// Invalid UTF-8 string
    InvalidUtf8 = 5,
    /// Network error
    NetworkError = 6,
    /// Authentication failed
    AuthenticationFailed = 7,
    /// Resource not found
    NotFound = 8,
    /// Permission denied
    PermissionDenied = 9,
    /// Timeout occurred
    Timeout = 10,
    /// Invalid state for operation
    InvalidState = 11,
    /// Rate limit exceeded
    RateLimited = 12,
    /// JSON payload could not be decoded into the expected model
    ParseError = 13,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::NullPointer => "Null pointer",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::InvalidUtf8 => "Invalid UTF-8 string",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::AuthenticationFailed => "Authentication failed",
            ErrorCode::NotFound => "Not found",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::InvalidState => "Invalid state",
            ErrorCode::RateLimited => "Rate limit exceeded",
            ErrorCode::ParseError => "Parse error",
        }
    }

    /// Map an HTTP status returned by the server to an error code
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::AuthenticationFailed,
            403 => ErrorCode::PermissionDenied,
            404 => ErrorCode::NotFound,
            408 => ErrorCode::Timeout,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::NetworkError,
        }
    }
}

/// Internal error type
#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// Server-side error type (e.g., Rocket.Chat's "error-invalid-room")
    pub(crate) error_type: Option<String>,
    /// Request ID from server headers for debugging
    pub(crate) request_id: Option<String>,
    /// HTTP status code if this error came from an HTTP response
    pub(crate) http_status: Option<u16>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Error {
            code,
            message: message.into(),
            error_type: None,
            request_id: None,
            http_status: None,
        }
    }

    pub fn null_pointer() -> Self {
        Error::new(ErrorCode::NullPointer, "Null pointer provided")
    }

    pub fn invalid_utf8() -> Self {
        Error::new(ErrorCode::InvalidUtf8, "Invalid UTF-8 string")
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::new(ErrorCode::InvalidArgument, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Error::new(ErrorCode::ParseError, msg)
    }

    pub fn not_logged_in() -> Self {
        Error::new(ErrorCode::AuthenticationFailed, "Missing user id and token")
    }

    /// Add the server-side error type (builder pattern)
    pub fn with_error_type(mut self, error_type: String) -> Self {
        self.error_type = Some(error_type);
        self
    }

    /// Add request ID for debugging (builder pattern)
    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Add HTTP status code (builder pattern)
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Get the server-side error type if available
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    /// Get the request ID if available
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Get the HTTP status code if available
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::parse(e.to_string())
    }
}

// Process-wide error storage for FFI
lazy_static::lazy_static! {
    static ref LAST_ERROR: Mutex<Option<Error>> = Mutex::new(None);
}

/// Set the last error (called internally when FFI functions fail)
pub(crate) fn set_last_error(error: Error) {
    if let Ok(mut last) = LAST_ERROR.lock() {
        *last = Some(error);
    }
}

/// Clear the last error
pub(crate) fn clear_last_error() {
    if let Ok(mut last) = LAST_ERROR.lock() {
        *last = None;
    }
}

/// Get the last error (for FFI)
pub(crate) fn get_last_error() -> Option<Error> {
    LAST_ERROR.lock().ok()?.clone()
}
