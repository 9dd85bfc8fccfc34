//! HTTP transport for the DataCite MDS API
//!
//! [`MdsConnection`] issues the six primitive MDS operations against one
//! authenticated endpoint and hands raw status/body pairs back to the
//! caller; interpreting them is the client layer's job.
//!
//! Use [`MdsConnectionFactory::authenticated_connection`] to construct
//! instances.
//!
//! [`MdsConnectionFactory::authenticated_connection`]: crate::registry::factory::MdsConnectionFactory::authenticated_connection

use crate::config::UrlRegistrationFormat;
use crate::error::{DoiClientError, Result};
use crate::registry::auth::CustomerAuthenticator;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

const PATH_DOI: &str = "doi";
const PATH_METADATA: &str = "metadata";
const APPLICATION_XML_UTF8: &str = "application/xml; charset=UTF-8";
const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

/// Status code and body of a single registry exchange, uninterpreted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }
}

/// One customer's connection to the MDS API.
///
/// Cheap, stateless wrapper around a shared `reqwest::Client`; a fresh value
/// is produced per logical operation and discarded afterwards.
#[derive(Debug, Clone)]
pub struct MdsConnection {
    client: Client,
    authenticator: CustomerAuthenticator,
    scheme: String,
    host: String,
    port: u16,
    url_format: UrlRegistrationFormat,
}

impl MdsConnection {
    pub fn new(
        client: Client,
        authenticator: CustomerAuthenticator,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        url_format: UrlRegistrationFormat,
    ) -> Self {
        Self {
            client,
            authenticator,
            scheme: scheme.into(),
            host: host.into(),
            port,
            url_format,
        }
    }

    /// Store a new version of metadata under `doi` (a bare prefix when
    /// minting, `prefix/suffix` when updating).
    pub async fn post_metadata(&self, doi: &str, datacite_xml: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("postMetadata", PATH_METADATA, Some(doi))?;
        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, APPLICATION_XML_UTF8)
            .body(datacite_xml.to_string());
        self.send("postMetadata", url, request).await
    }

    /// Fetch the most recent metadata registered for `doi`.
    pub async fn get_metadata(&self, doi: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("getMetadata", PATH_METADATA, Some(doi))?;
        let request = self.client.get(url.clone());
        self.send("getMetadata", url, request).await
    }

    /// Mark the dataset inactive. Posting new metadata reactivates it.
    pub async fn delete_metadata(&self, doi: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("deleteMetadata", PATH_METADATA, Some(doi))?;
        let request = self.client.delete(url.clone());
        self.send("deleteMetadata", url, request).await
    }

    /// Fetch the landing page URL currently registered for `doi`.
    pub async fn get_doi(&self, doi: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("getDoi", PATH_DOI, Some(doi))?;
        let request = self.client.get(url.clone());
        self.send("getDoi", url, request).await
    }

    /// Delete `doi`, permitted only while it is still a draft.
    pub async fn delete_doi(&self, doi: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("deleteDoi", PATH_DOI, Some(doi))?;
        let request = self.client.delete(url.clone());
        self.send("deleteDoi", url, request).await
    }

    /// Register a landing page for `doi`, or replace the existing one.
    ///
    /// The body representation depends on the configured
    /// [`UrlRegistrationFormat`], since the accepted format differs between
    /// registry API revisions.
    pub async fn register_url(&self, doi: &str, landing_page: &str) -> Result<RawResponse> {
        let url = self.endpoint_url("registerUrl", PATH_DOI, Some(doi))?;
        let request = match self.url_format {
            UrlRegistrationFormat::TextPlain => self
                .client
                .put(url.clone())
                .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
                .body(format!("doi={doi}\nurl={landing_page}")),
            UrlRegistrationFormat::FormUrlEncoded => self
                .client
                .put(url.clone())
                .form(&[("doi", doi), ("url", landing_page)]),
        };
        self.send("registerUrl", url, request).await
    }

    /// Build `https://host:port/{segment}/{doi}` with each path component
    /// escaped individually, so a malformed identifier cannot smuggle extra
    /// path segments into the request.
    fn endpoint_url(&self, operation: &'static str, segment: &str, doi: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port)).map_err(
            |e| DoiClientError::RequestTarget {
                operation,
                message: e.to_string(),
            },
        )?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DoiClientError::RequestTarget {
                    operation,
                    message: format!("cannot-be-a-base url for host {}", self.host),
                })?;
            path.pop_if_empty();
            path.push(segment);
            if let Some(doi) = doi {
                // The prefix/suffix separator stays a real slash; anything
                // else inside either part gets percent-escaped.
                for part in doi.split('/') {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        operation: &'static str,
        url: Url,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse> {
        let request = self.attach_credentials(&url, request)?;
        debug!(operation, %url, "sending MDS request");
        let response = request
            .send()
            .await
            .map_err(|source| transport_error(operation, source))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| transport_error(operation, source))?;
        debug!(operation, status, "MDS response received");
        Ok(RawResponse { status, body })
    }

    /// Pre-emptive Basic auth: ask the customer-scoped authenticator for
    /// credentials for the actual request destination. Destinations outside
    /// the authenticator's scope get no credentials attached.
    fn attach_credentials(
        &self,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        let host = url.host_str().unwrap_or(&self.host);
        let port = url.port_or_known_default().unwrap_or(self.port);
        match self.authenticator.challenge(host, port)? {
            Some(credentials) => {
                Ok(request.basic_auth(credentials.username, Some(credentials.password)))
            }
            None => Ok(request),
        }
    }
}

fn transport_error(operation: &'static str, source: reqwest::Error) -> DoiClientError {
    error!(operation, error = %source, "error during API communication");
    DoiClientError::Transport { operation, source }
}
