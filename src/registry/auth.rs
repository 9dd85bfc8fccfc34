//! Authentication for DOI registry access
//!
//! The MDS API uses HTTP Basic auth with per-customer credentials. A
//! [`CustomerAuthenticator`] hands them out only when the challenged
//! destination matches the host and port it was scoped to at construction,
//! so credentials never leak to redirects or unexpected endpoints.

use crate::config::CredentialStore;
use crate::error::{DoiClientError, Result};
use std::fmt;
use std::sync::Arc;

/// Username/password pair for HTTP Basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves Basic credentials for a customer from the credential snapshot.
#[derive(Debug, Clone)]
pub struct AuthenticationProvider {
    store: Arc<CredentialStore>,
}

impl AuthenticationProvider {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Credentials for the given customer, or `NoCredentials` when none are
    /// stored. Raised at the moment credentials are demanded, not earlier.
    pub fn credentials_for(&self, customer_id: &str) -> Result<BasicCredentials> {
        let config = self
            .store
            .get(customer_id)
            .ok_or_else(|| DoiClientError::NoCredentials(customer_id.to_string()))?;
        // `get` only returns fully configured records; ok_or keeps this
        // panic-free regardless.
        let username = config
            .username
            .clone()
            .ok_or_else(|| DoiClientError::NoCredentials(customer_id.to_string()))?;
        let password = config
            .password
            .clone()
            .ok_or_else(|| DoiClientError::NoCredentials(customer_id.to_string()))?;
        Ok(BasicCredentials { username, password })
    }
}

/// Credential callback scoped to one customer and one registry endpoint.
///
/// Everything the challenge decision needs is an explicit field; there is no
/// captured outer state.
#[derive(Debug, Clone)]
pub struct CustomerAuthenticator {
    provider: AuthenticationProvider,
    customer_id: String,
    host: String,
    port: u16,
}

impl CustomerAuthenticator {
    pub fn new(
        provider: AuthenticationProvider,
        customer_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            provider,
            customer_id: customer_id.into(),
            host: host.into(),
            port,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Answer an authentication challenge from `host:port`.
    ///
    /// Returns `Ok(None)` for any destination other than the configured
    /// registry endpoint. For the configured endpoint, missing customer
    /// credentials are an error rather than a silent `None`.
    pub fn challenge(&self, host: &str, port: u16) -> Result<Option<BasicCredentials>> {
        if !self.is_configured_registry_endpoint(host, port) {
            return Ok(None);
        }
        self.provider.credentials_for(&self.customer_id).map(Some)
    }

    fn is_configured_registry_endpoint(&self, host: &str, port: u16) -> bool {
        self.host.eq_ignore_ascii_case(host) && self.port == port
    }
}
