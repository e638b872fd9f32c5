//! Resolution of the connection to sweep from flags, environment and file.

use super::{Config, ConfigError, Result};

/// Values supplied on the command line or through the environment.
///
/// Each one wins over the matching value from the config file. Blank values
/// count as absent.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub base_url: Option<String>,
}

/// Where the work item API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Service root, e.g. `https://dev.azure.com`.
    pub base_url: String,
    /// Organization name.
    pub organization: String,
    /// Project name.
    pub project: String,
    /// The `api-version` query parameter.
    pub api_version: String,
}

/// A fully resolved connection and the profile it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Profile name, used as the keyring entry for the token.
    pub name: Option<String>,
    pub connection: Connection,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Resolve the connection to use.
    ///
    /// Precedence, highest first: overrides, the selected profile (the
    /// `--profile` override or `settings.default_profile`), settings.
    ///
    /// # Errors
    ///
    /// Returns `ProfileNotFound` for an unknown profile name and
    /// `MissingValue` when organization or project is supplied by no source.
    pub fn resolve(&self, overrides: &Overrides) -> Result<ResolvedProfile> {
        let profile_name = present(&overrides.profile)
            .map(str::to_string)
            .or_else(|| self.settings.default_profile.clone());

        let profile = match &profile_name {
            Some(name) => Some(
                self.profile(name)
                    .ok_or_else(|| ConfigError::ProfileNotFound(name.clone()))?,
            ),
            None => None,
        };

        let organization = present(&overrides.organization)
            .map(str::to_string)
            .or_else(|| profile.map(|p| p.organization.clone()))
            .ok_or(ConfigError::MissingValue {
                name: "organization",
                hint: "--org, AZURE_DEVOPS_ORG or a profile",
            })?;

        let project = present(&overrides.project)
            .map(str::to_string)
            .or_else(|| profile.map(|p| p.project.clone()))
            .ok_or(ConfigError::MissingValue {
                name: "project",
                hint: "--project, AZURE_DEVOPS_PROJECT or a profile",
            })?;

        let base_url = present(&overrides.base_url)
            .map(str::to_string)
            .or_else(|| profile.and_then(|p| p.base_url.clone()))
            .unwrap_or_else(|| self.settings.base_url.clone());

        Ok(ResolvedProfile {
            name: profile_name,
            connection: Connection {
                base_url,
                organization,
                project,
                api_version: self.settings.api_version.clone(),
            },
        })
    }
}
