//! Application settings configuration.

use serde::{Deserialize, Serialize};

/// The hosted Azure DevOps service.
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// The REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "7.0";

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Service root used by profiles that do not set their own.
    pub base_url: String,
    /// The `api-version` query parameter.
    pub api_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}
