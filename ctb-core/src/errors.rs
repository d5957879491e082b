//! # Errors
//!
//! Every request the client issues settles into exactly one of:
//! - a value
//! - `RequestError::Transport`: no response was obtained
//! - `RequestError::Http`: a response came back outside the success range
//! - `RequestError::Parsing`: a successful response did not decode
//! - `RequestError::Cancelled`: the caller gave up on it
//!
//! `ApiError` is one structured error item as reported by the backend, or
//! synthesised by the client when the backend did not report one.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parse::{decode_api_errors, ParsingErrors};

/// Domain stamped on every `ApiError` the client produces.
pub const ERROR_DOMAIN: &str = "com.creatubbles.apiclient.errordomain";

pub const DEFAULT_STATUS: i32 = -6000;
pub const UNKNOWN_STATUS: i32 = -6001;
pub const LOGIN_STATUS: i32 = -6002;
pub const UPLOAD_CANCELLED_STATUS: i32 = -6003;

/// One structured error item (JSON:API `errors[]` entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: i32,
    pub code: String,
    pub title: String,
    pub source: String,
    pub detail: String,
    pub domain: String,
}

impl ApiError {
    pub fn new(status: i32, title: impl Into<String>) -> Self {
        Self {
            status,
            code: String::new(),
            title: title.into(),
            source: String::new(),
            detail: String::new(),
            domain: ERROR_DOMAIN.to_string(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Error for a response whose body carried no usable `errors` array.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::new(i32::from(status), format!("Request failed with status {status}"))
            .with_detail(body.trim())
    }

    /// Stands in for a failure whose details are not meant for end users.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(UNKNOWN_STATUS, "An unknown error occurred.").with_detail(detail)
    }

    /// Rejected password grant.
    pub fn login_failed(detail: impl Into<String>) -> Self {
        Self::new(LOGIN_STATUS, "Login failed").with_detail(detail)
    }

    pub fn upload_cancelled() -> Self {
        Self::new(UPLOAD_CANCELLED_STATUS, "Upload cancelled")
            .with_detail("The upload was cancelled by the user.")
    }

    /// Decodes the backend's error list from a failed response.
    ///
    /// Never returns an empty list: when the body holds no decodable errors a
    /// single item is built from the status code and raw body.
    pub fn list_from_response(status: u16, body: &str) -> Vec<ApiError> {
        match decode_api_errors(body) {
            Ok(errors) if !errors.is_empty() => errors,
            _ => vec![Self::from_response(status, body)],
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.status)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Flat tag for a `RequestError`, handy for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Http,
    Parsing,
    Cancelled,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Http => "http",
            ErrorKind::Parsing => "parsing",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type for single API requests.
pub type RequestResult<T> = Result<T, RequestError>;

/// Classified failure of a single request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("HTTP {status}: {}", summarize(.errors))]
    Http { status: u16, errors: Vec<ApiError> },

    #[error("Invalid response body: {0}")]
    Parsing(ParsingErrors),

    #[error("Request cancelled")]
    Cancelled,
}

impl RequestError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn http(status: u16, errors: Vec<ApiError>) -> Self {
        Self::Http { status, errors }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Transport { .. } => ErrorKind::Transport,
            RequestError::Http { .. } => ErrorKind::Http,
            RequestError::Parsing(_) => ErrorKind::Parsing,
            RequestError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    /// Backend error items, empty for anything but `Http`.
    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            RequestError::Http { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Whether repeating the same request could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Transport { .. } => true,
            RequestError::Http { status, .. } => is_retryable_status(*status),
            RequestError::Parsing(_) | RequestError::Cancelled => false,
        }
    }
}

impl From<ParsingErrors> for RequestError {
    fn from(errors: ParsingErrors) -> Self {
        RequestError::Parsing(errors)
    }
}

/// Server-side and throttling statuses; client errors are not worth repeating.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || status >= 500
}

fn summarize(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
