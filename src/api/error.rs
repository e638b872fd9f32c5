//! API error types for the Azure DevOps client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the work item REST API.
///
/// Every call fails with the first error it meets. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with something other than `200 OK`.
    #[error("Unexpected HTTP status {status}: {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response body was not what the endpoint promises.
    #[error("Invalid API response: {0}")]
    Decode(String),

    /// The organization or project does not form a usable URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Keyring error when storing/retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: StatusCode, context: &str) -> Self {
        ApiError::UnexpectedStatus {
            status: status.as_u16(),
            context: context.to_string(),
        }
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the credential was rejected.
    ///
    /// Azure DevOps answers an invalid PAT with 401, or with 203 and a
    /// sign-in page.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(203))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_status_404() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "work item 205");
        match err {
            ApiError::UnexpectedStatus { status, ref context } => {
                assert_eq!(status, 404);
                assert_eq!(context, "work item 205");
            }
            _ => panic!("Expected UnexpectedStatus error"),
        }
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "x").is_unauthorized());
        assert!(ApiError::from_status(StatusCode::NON_AUTHORITATIVE_INFORMATION, "x").is_unauthorized());
        assert!(!ApiError::from_status(StatusCode::NOT_FOUND, "x").is_unauthorized());
        assert!(!ApiError::Decode("bad".to_string()).is_unauthorized());
    }

    #[test]
    fn test_status_absent_for_decode_error() {
        assert_eq!(ApiError::Decode("x".to_string()).status(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "work item 205");
        assert_eq!(
            err.to_string(),
            "Unexpected HTTP status 404: work item 205"
        );

        let err = ApiError::Decode("missing workItems".to_string());
        assert_eq!(err.to_string(), "Invalid API response: missing workItems");
    }
}
