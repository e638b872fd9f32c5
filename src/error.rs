//! Centralized error types for witsweep.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::wiql::WiqlError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A user-supplied WIQL query did not parse.
    #[error("Invalid WIQL: {0}")]
    Wiql(#[from] WiqlError),

    /// IO errors (stdin, file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) | ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check it is readable.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
                ConfigError::MissingValue { name, hint } => {
                    format!("No {} configured. Set {}.", name, hint)
                }
            },
            AppError::Api(e) => match e {
                e if e.is_unauthorized() => {
                    "Authentication failed. Please check your personal access token.".to_string()
                }
                ApiError::UnexpectedStatus { status: 404, .. } => {
                    "Not found. Please check the organization and project names.".to_string()
                }
                ApiError::UnexpectedStatus { status, context } => {
                    format!("Azure DevOps answered HTTP {}: {}", status, context)
                }
                ApiError::Transport(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::Decode(_) => {
                    "Unexpected response from Azure DevOps. Please try again.".to_string()
                }
                ApiError::InvalidUrl(msg) => format!("Invalid service URL: {}", msg),
                ApiError::Keyring(_) => {
                    "Could not access secure storage for the access token.".to_string()
                }
            },
            AppError::Wiql(e) => format!("The WIQL query is invalid: {}", e),
            AppError::Io(_) => "An input/output operation failed.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::MissingValue { .. }) => {
                Some("Pass --org and --project, or add a profile to the config file.")
            }
            AppError::Api(e) if e.is_unauthorized() => Some(
                "Create a token with Work Items (Read & Write) scope and set AZURE_DEVOPS_PAT \
                 or run 'witsweep login'.",
            ),
            AppError::Api(ApiError::Keyring(_)) => {
                Some("Set AZURE_DEVOPS_PAT or run 'witsweep login' to store a token.")
            }
            AppError::Api(ApiError::Transport(_)) => {
                Some("Check your internet connection and the service URL.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoConfigDir.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_user_message_unauthorized() {
        let err = AppError::Api(ApiError::from_status(StatusCode::UNAUTHORIZED, "wiql"));
        assert!(err.user_message().contains("Authentication failed"));
        assert!(err.suggested_action().unwrap().contains("AZURE_DEVOPS_PAT"));
    }

    #[test]
    fn test_user_message_not_found() {
        let err = AppError::Api(ApiError::from_status(StatusCode::NOT_FOUND, "wiql"));
        assert!(err.user_message().contains("organization and project"));
    }

    #[test]
    fn test_user_message_other_status() {
        let err = AppError::Api(ApiError::from_status(StatusCode::BAD_REQUEST, "TF51005"));
        let msg = err.user_message();
        assert!(msg.contains("400"));
        assert!(msg.contains("TF51005"));
    }

    #[test]
    fn test_user_message_missing_value() {
        let err = AppError::Config(ConfigError::MissingValue {
            name: "organization",
            hint: "--org",
        });
        assert_eq!(err.user_message(), "No organization configured. Set --org.");
        assert!(err.suggested_action().is_some());
    }

    #[test]
    fn test_wiql_error_message() {
        let err: AppError = WiqlError::UnterminatedLiteral { offset: 3 }.into();
        assert!(err.user_message().contains("offset 3"));
        assert!(err.suggested_action().is_none());
    }

    #[test]
    fn test_other_error() {
        let err = AppError::other("something went wrong");
        assert_eq!(err.user_message(), "something went wrong");
    }
}
