//! Credential pair and credential provider implementations.
//!
//! This module defines [`Credentials`] (the access key ID plus secret key used
//! for one signing call) and the [`CredentialProvider`] trait the signer asks
//! for a fresh pair on every request. Credential storage and rotation live
//! behind the trait; the signer itself never caches what it is given.

use std::fmt;

use crate::error::AuthError;

/// Environment variables checked for the access key ID, in order.
const ACCESS_KEY_ENV_VARS: &[&str] = &["GCP_ACCESS_KEY_ID", "ACCESS_KEY"];

/// Environment variables checked for the secret key, in order.
const SECRET_KEY_ENV_VARS: &[&str] = &["GCP_SECRET_ACCESS_KEY", "SECRET_KEY"];

/// Opaque secret signing key.
///
/// The `Debug` implementation never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**redacted**)")
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

/// An access key ID together with its secret signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key identifier, written in clear into the `Authorization` header.
    pub access_key_id: String,
    /// Secret key used to key the HMAC.
    pub secret_key: SecretKey,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<SecretKey>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Check that both halves of the pair are present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if either half is empty.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.access_key_id.is_empty() || self.secret_key.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

/// Source of the credential pair used to sign a request.
///
/// Implementations are consulted once per signed request.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Return the credential pair to sign the next request with.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if no usable pair is available.
    fn credentials(&self) -> Result<Credentials, AuthError>;
}

/// A provider that always returns the same credential pair.
///
/// # Examples
///
/// ```
/// use ruststack_gcp_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new("GOOGTS7C7FUP3AIRVJTE2BCD", "secret");
/// let creds = provider.credentials().unwrap();
/// assert_eq!(creds.access_key_id, "GOOGTS7C7FUP3AIRVJTE2BCD");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a provider from an access key ID and secret key.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<SecretKey>) -> Self {
        Self {
            credentials: Credentials::new(access_key_id, secret_key),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        self.credentials.validate()?;
        Ok(self.credentials.clone())
    }
}

/// A provider that reads the credential pair from environment variables on
/// every call.
///
/// The access key ID comes from `GCP_ACCESS_KEY_ID` (or `ACCESS_KEY`) and the
/// secret key from `GCP_SECRET_ACCESS_KEY` (or `SECRET_KEY`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        let access_key_id =
            first_env_var(ACCESS_KEY_ENV_VARS).ok_or(AuthError::MissingCredentials)?;
        let secret_key =
            first_env_var(SECRET_KEY_ENV_VARS).ok_or(AuthError::MissingCredentials)?;

        let credentials = Credentials::new(access_key_id, secret_key);
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Return the value of the first set, non-empty variable in `names`.
fn first_env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_return_static_credentials() {
        let provider = StaticCredentialProvider::new("AKID", "secret");

        let creds = provider.credentials().unwrap();
        assert_eq!(creds.access_key_id, "AKID");
        assert_eq!(creds.secret_key.as_bytes(), b"secret");
    }

    #[test]
    fn test_should_reject_empty_access_key() {
        let provider = StaticCredentialProvider::new("", "secret");
        assert_eq!(provider.credentials(), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn test_should_reject_empty_secret_key() {
        let creds = Credentials::new("AKID", "");
        assert_eq!(creds.validate(), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn test_should_redact_secret_key_in_debug_output() {
        let creds = Credentials::new("AKID", "super-secret-value");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_should_return_none_when_no_env_var_is_set() {
        assert_eq!(first_env_var(&["RUSTSTACK_GCP_AUTH_TEST_UNSET_VAR"]), None);
    }
}
