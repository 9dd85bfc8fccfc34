//! Customer credential records and registry settings
//!
//! Credentials for all customers arrive as one JSON secret blob, parsed once
//! at startup into an immutable [`CredentialStore`] snapshot. How the blob is
//! fetched (secrets manager, file, environment) is the caller's business.

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Wire format used by the MDS API for landing-page registration.
///
/// The registry changed the accepted body across API revisions, so the format
/// is a configuration parameter rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlRegistrationFormat {
    /// `doi=<id>\nurl=<url>` with `text/plain;charset=UTF-8`.
    #[default]
    TextPlain,
    /// `doi=<id>&url=<url>` with `application/x-www-form-urlencoded`.
    FormUrlEncoded,
}

/// Target MDS endpoint plus wire-format selection, passed by parameter into
/// the connection factory. Nothing below this struct reads the environment.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// `https` everywhere outside of tests against a local stub server.
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub url_format: UrlRegistrationFormat,
    pub connect_timeout: Duration,
}

impl RegistrySettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            port,
            url_format: UrlRegistrationFormat::default(),
            connect_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_url_format(mut self, format: UrlRegistrationFormat) -> Self {
        self.url_format = format;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

/// One customer's registry credentials as stored in the secret blob.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSecretConfig {
    pub customer_id: String,
    pub doi_prefix: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-customer MDS host override, rarely set.
    #[serde(default)]
    pub mds_host: Option<String>,
}

impl CustomerSecretConfig {
    /// A record missing any required field is unusable as a whole.
    pub fn is_fully_configured(&self) -> bool {
        self.doi_prefix.is_some() && self.username.is_some() && self.password.is_some()
    }
}

// Records end up in debug logs; the password never does.
impl fmt::Debug for CustomerSecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerSecretConfig")
            .field("customer_id", &self.customer_id)
            .field("doi_prefix", &self.doi_prefix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("mds_host", &self.mds_host)
            .finish()
    }
}

/// Read-only snapshot of all customer credentials, keyed by customer id.
///
/// Loaded once at construction; there is no hot-reload. Replacing credentials
/// means building a new store.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    configs: HashMap<String, CustomerSecretConfig>,
}

impl CredentialStore {
    /// Parse the secret blob, a JSON array of credential records.
    ///
    /// Malformed input fails the whole load; the store never comes up
    /// partially populated.
    pub fn from_json(secret_blob: &str) -> Result<Self> {
        let records: Vec<CustomerSecretConfig> = serde_json::from_str(secret_blob)?;
        let configs = records
            .into_iter()
            .map(|record| (record.customer_id.clone(), record))
            .collect();
        Ok(Self { configs })
    }

    /// Look up a customer's credentials. Partially configured records are
    /// reported as absent; absence itself is a normal outcome here and the
    /// caller decides whether it is fatal.
    pub fn get(&self, customer_id: &str) -> Option<&CustomerSecretConfig> {
        self.configs
            .get(customer_id)
            .filter(|config| config.is_fully_configured())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
