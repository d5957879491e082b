use ctb_core::{is_retryable_status, ApiError, RequestError, DEFAULT_STATUS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What end users are shown for internal failures.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

pub const MISSING_DATA_MESSAGE: &str = "Invalid or missing data in response body.";

/// Result type for upload steps.
pub type UploadResult<T> = Result<T, UploadError>;

/// Classified failure of an upload run.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UploadError {
    /// No response was obtained.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The backend answered outside the success range.
    #[error("Backend rejected the request with status {status}")]
    ApplicationHttp { status: u16, errors: Vec<ApiError> },

    /// A response arrived but cannot be used. Not fixable by retrying.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl UploadError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, UploadError::Internal { .. })
    }

    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            UploadError::ApplicationHttp { errors, .. } => errors,
            _ => &[],
        }
    }

    /// The failure as backend-style error items. Internal failures become
    /// one `ApiError::unknown` whose detail is meant for logs only.
    pub fn to_api_errors(&self) -> Vec<ApiError> {
        match self {
            UploadError::ApplicationHttp { errors, .. } => errors.clone(),
            UploadError::Transport { message } => {
                vec![ApiError::new(DEFAULT_STATUS, "Connection failed").with_detail(message.as_str())]
            }
            UploadError::Internal { message } => vec![ApiError::unknown(message.as_str())],
        }
    }

    /// Whether starting the upload again could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Transport { .. } => true,
            UploadError::ApplicationHttp { status, .. } => is_retryable_status(*status),
            UploadError::Internal { .. } => false,
        }
    }

    /// Text safe to show an end user; internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Internal { .. } => UNKNOWN_ERROR_MESSAGE.to_string(),
            UploadError::ApplicationHttp { errors, status } => errors
                .first()
                .map(|error| {
                    if error.detail.is_empty() {
                        error.title.clone()
                    } else {
                        error.detail.clone()
                    }
                })
                .unwrap_or_else(|| format!("Request failed with status {status}")),
            UploadError::Transport { message } => message.clone(),
        }
    }
}

/// Why a run stopped before finishing every step.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    Cancelled,
    Failed(UploadError),
}

impl From<UploadError> for Halt {
    fn from(error: UploadError) -> Self {
        Halt::Failed(error)
    }
}

impl Halt {
    /// Classification for calls to the Creatubbles API itself: HTTP failures
    /// carry the backend's error items, undecodable bodies are internal.
    pub fn from_backend(error: RequestError) -> Self {
        match error {
            RequestError::Cancelled => Halt::Cancelled,
            RequestError::Transport { message } => Halt::Failed(UploadError::Transport { message }),
            RequestError::Http { status, errors } => {
                Halt::Failed(UploadError::ApplicationHttp { status, errors })
            }
            RequestError::Parsing(errors) => Halt::Failed(UploadError::internal(format!(
                "{MISSING_DATA_MESSAGE} {errors}"
            ))),
        }
    }

    /// Classification for calls to foreign hosts (storage, source URLs):
    /// their error bodies mean nothing to the user, so any HTTP failure is
    /// internal and keeps the raw status and body for the logs.
    pub fn from_foreign(error: RequestError, body: &str) -> Self {
        match error {
            RequestError::Cancelled => Halt::Cancelled,
            RequestError::Transport { message } => Halt::Failed(UploadError::Transport { message }),
            RequestError::Http { status, .. } => Halt::Failed(UploadError::internal(format!(
                "Response code '{status}' and body '{body}'"
            ))),
            RequestError::Parsing(errors) => Halt::Failed(UploadError::internal(format!(
                "{MISSING_DATA_MESSAGE} {errors}"
            ))),
        }
    }
}
