use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Error taxonomy shared by every handler.
///
/// Each handler catches this at its top level and converts it to a
/// structured JSON response; no variant ever crosses the Lambda boundary
/// as an unhandled fault.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed or missing required input (400).
    #[error("{0}")]
    Input(String),

    /// A referenced object does not exist (404). Carries the full
    /// user-facing message, key included.
    #[error("{0}")]
    NotFound(String),

    /// A managed-service call failed (500); message passed through.
    #[error("{0}")]
    Upstream(String),

    /// The email body could not be reduced to a question/answer pair.
    #[error("{0}")]
    Extraction(String),
}

impl BackendError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            BackendError::Input(_) => 400,
            BackendError::NotFound(_) => 404,
            BackendError::Upstream(_) | BackendError::Extraction(_) => 500,
        }
    }
}

// One blanket conversion covers every aws-sdk-* crate: they all re-export
// the same smithy SdkError type. DisplayErrorContext keeps the service
// error message instead of the bare "service error" wrapper.
impl<E, R> From<SdkError<E, R>> for BackendError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(err: SdkError<E, R>) -> Self {
        BackendError::Upstream(DisplayErrorContext(&err).to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Input(format!("Invalid JSON: {err}"))
    }
}

impl From<base64::DecodeError> for BackendError {
    fn from(err: base64::DecodeError) -> Self {
        BackendError::Input(format!("Invalid base64 content: {err}"))
    }
}
