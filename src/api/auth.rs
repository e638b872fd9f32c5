//! Authentication handling for the Azure DevOps API.
//!
//! Personal access tokens are sent with HTTP Basic auth using an empty user
//! name. Tokens can be kept in the OS keyring, one entry per profile.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::error::{ApiError, Result};

/// The keyring service name for witsweep tokens.
const KEYRING_SERVICE: &str = "witsweep";

/// Authentication credentials for Azure DevOps.
///
/// Holds only the encoded header value. `Debug` output is redacted.
#[derive(Clone)]
pub struct Auth {
    /// The complete "Basic ..." header value.
    auth_header: String,
}

impl Auth {
    /// Create credentials from a personal access token.
    pub fn new(token: &str) -> Self {
        Self {
            auth_header: build_auth_header(token),
        }
    }

    /// Create credentials from the token stored in the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be retrieved from the keyring.
    pub fn from_keyring(profile_name: &str) -> Result<Self> {
        let token = get_token(profile_name)?;
        Ok(Self::new(&token))
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth").field("auth_header", &"<redacted>").finish()
    }
}

/// Build the Basic Auth header value.
///
/// Encodes ":token" (empty user name) in Base64 and prepends "Basic ".
fn build_auth_header(token: &str) -> String {
    let encoded = BASE64.encode(format!(":{}", token).as_bytes());
    format!("Basic {}", encoded)
}

/// Store a personal access token in the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token)
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;

    Ok(())
}

/// Retrieve a personal access token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be retrieved from the keyring.
pub fn get_token(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete a personal access token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be deleted from the keyring.
pub fn delete_token(profile_name: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))?;

    Ok(())
}
