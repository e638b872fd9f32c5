//! Azure DevOps profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// An Azure DevOps profile configuration.
///
/// Profiles store the organization and project to sweep. Personal access
/// tokens are stored separately in the OS keychain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// The organization name, e.g. "Olopo".
    pub organization: String,

    /// The project name, e.g. "ERP".
    pub project: String,

    /// Service root override, e.g. an on-premises collection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Profile {
    /// Create a new profile on the default service root.
    pub fn new(name: String, organization: String, project: String) -> Self {
        Self {
            name,
            organization,
            project,
            base_url: None,
        }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.organization.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': organization cannot be empty",
                self.name
            )));
        }

        if self.organization.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': organization '{}' must be a name, not a URL",
                self.name, self.organization
            )));
        }

        if self.project.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': project cannot be empty",
                self.name
            )));
        }

        if let Some(url) = &self.base_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ConfigError::ValidationError(format!(
                    "profile '{}': base URL must start with http:// or https://",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new("work".to_string(), "Olopo".to_string(), "ERP".to_string())
    }

    #[test]
    fn test_valid_profile() {
        assert!(profile().validate().is_ok());
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let mut p = profile();
        p.name = "my work".to_string();
        assert!(p
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot contain whitespace"));
    }

    #[test]
    fn test_empty_project_rejected() {
        let mut p = profile();
        p.project = " ".to_string();
        assert!(p
            .validate()
            .unwrap_err()
            .to_string()
            .contains("project cannot be empty"));
    }

    #[test]
    fn test_organization_url_rejected() {
        let mut p = profile();
        p.organization = "https://dev.azure.com/Olopo".to_string();
        assert!(p.validate().unwrap_err().to_string().contains("not a URL"));
    }

    #[test]
    fn test_base_url_scheme_checked() {
        let mut p = profile();
        p.base_url = Some("tfs.local/DefaultCollection".to_string());
        assert!(p.validate().is_err());

        p.base_url = Some("http://localhost:8080/tfs".to_string());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_profile_serialization() {
        let p = profile();
        let toml_str = toml::to_string(&p).unwrap();
        assert!(!toml_str.contains("base_url"));

        let parsed: Profile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, p);
    }
}
