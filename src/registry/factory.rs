//! Connection factory binding credentials to registry endpoints
//!
//! Builds per-customer [`MdsConnection`]s so callers never touch raw HTTP
//! setup. One shared `reqwest::Client` with a bounded connect timeout backs
//! every connection; the per-customer part is just the scoped authenticator.

use crate::config::{CredentialStore, RegistrySettings};
use crate::error::{DoiClientError, Result};
use crate::registry::auth::{AuthenticationProvider, CustomerAuthenticator};
use crate::registry::connection::MdsConnection;
use crate::registry::rest::RestConnection;
use reqwest::Client;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MdsConnectionFactory {
    client: Client,
    store: Arc<CredentialStore>,
    provider: AuthenticationProvider,
    settings: RegistrySettings,
}

impl MdsConnectionFactory {
    pub fn new(store: Arc<CredentialStore>, settings: RegistrySettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|source| DoiClientError::Transport {
                operation: "connectionSetup",
                source,
            })?;
        Ok(Self::with_client(client, store, settings))
    }

    /// Constructor for tests that need to supply their own client.
    pub fn with_client(
        client: Client,
        store: Arc<CredentialStore>,
        settings: RegistrySettings,
    ) -> Self {
        let provider = AuthenticationProvider::new(Arc::clone(&store));
        Self {
            client,
            store,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    /// A connection for `customer_id`, authenticated against the customer's
    /// registry endpoint.
    ///
    /// Whether the customer actually has credentials is not checked here;
    /// that surfaces on first use, when the endpoint demands them.
    pub fn authenticated_connection(&self, customer_id: &str) -> MdsConnection {
        let host = self
            .store
            .get(customer_id)
            .and_then(|config| config.mds_host.clone())
            .unwrap_or_else(|| self.settings.host.clone());
        let authenticator = CustomerAuthenticator::new(
            self.provider.clone(),
            customer_id,
            host.clone(),
            self.settings.port,
        );
        MdsConnection::new(
            self.client.clone(),
            authenticator,
            self.settings.scheme.clone(),
            host,
            self.settings.port,
            self.settings.url_format,
        )
    }

    /// A connection to the REST (JSON-API) endpoint for `customer_id`.
    ///
    /// Unlike the MDS path, the REST endpoint never challenges for
    /// credentials, so they are resolved eagerly here: an unknown customer
    /// fails before any request is built.
    pub fn rest_connection(&self, customer_id: &str) -> Result<RestConnection> {
        let credentials = self.provider.credentials_for(customer_id)?;
        let prefix = self
            .store
            .get(customer_id)
            .and_then(|config| config.doi_prefix.clone())
            .ok_or_else(|| DoiClientError::Configuration(customer_id.to_string()))?;
        Ok(RestConnection::new(
            self.client.clone(),
            self.settings.scheme.clone(),
            self.settings.host.clone(),
            self.settings.port,
            credentials,
            prefix,
        ))
    }
}
