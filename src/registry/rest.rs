//! DataCite REST (JSON-API) connection
//!
//! The newer registry endpoint mints draft DOIs through `POST /dois` with a
//! JSON-API envelope instead of the MDS metadata round-trip. Only the draft
//! DOI envelope is modelled here; the full JSON-API response schema is out
//! of scope.

use crate::doi::Doi;
use crate::error::{DoiClientError, Result};
use crate::registry::auth::BasicCredentials;
use crate::registry::connection::RawResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

const DOIS_PATH: &str = "dois";
const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";
const DOIS_TYPE: &str = "dois";

/// JSON-API envelope for a draft DOI, both request and response shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftDoiDto {
    pub data: DraftDoiData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftDoiData {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub attributes: DraftDoiAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftDoiAttributes {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl DraftDoiDto {
    /// Request body asking the registry to mint a draft under `prefix`.
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            data: DraftDoiData {
                resource_type: DOIS_TYPE.to_string(),
                id: None,
                attributes: DraftDoiAttributes {
                    prefix: prefix.to_string(),
                    doi: None,
                    suffix: None,
                },
            },
        }
    }

    /// The minted identifier from a registry response envelope.
    pub fn to_doi(&self) -> Result<Doi> {
        let identifier = self
            .data
            .attributes
            .doi
            .as_deref()
            .or(self.data.id.as_deref())
            .ok_or_else(|| {
                DoiClientError::ResponseParse("draft DOI envelope without identifier".to_string())
            })?;
        Doi::from_identifier(identifier)
    }
}

/// One customer's connection to the REST API, carrying its own Basic auth
/// header because this endpoint never challenges for credentials.
#[derive(Debug, Clone)]
pub struct RestConnection {
    client: Client,
    scheme: String,
    host: String,
    port: u16,
    credentials: BasicCredentials,
    prefix: String,
}

impl RestConnection {
    pub fn new(
        client: Client,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        credentials: BasicCredentials,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            scheme: scheme.into(),
            host: host.into(),
            port,
            credentials,
            prefix: prefix.into(),
        }
    }

    /// Mint a draft DOI under the connection's prefix.
    pub async fn create_draft_doi(&self) -> Result<Doi> {
        let url = self.endpoint_url("createDraftDoi", None)?;
        let body = serde_json::to_string(&DraftDoiDto::from_prefix(&self.prefix)).map_err(
            |source| DoiClientError::RequestBody {
                operation: "createDraftDoi",
                source,
            },
        )?;
        debug!(%url, prefix = %self.prefix, "requesting draft DOI");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .header(AUTHORIZATION, self.authorization())
            .body(body)
            .send()
            .await
            .map_err(|source| transport_error("createDraftDoi", source))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| transport_error("createDraftDoi", source))?;
        if !(200..300).contains(&status) {
            error!(
                prefix = %self.prefix,
                status,
                "error creating new DOI with metadata"
            );
            return Err(DoiClientError::CreateDoi {
                prefix: self.prefix.clone(),
                status,
            });
        }
        let envelope: DraftDoiDto =
            serde_json::from_str(&body).map_err(|_| DoiClientError::ResponseParse(body))?;
        envelope.to_doi()
    }

    /// Fetch the JSON-API representation of a DOI.
    ///
    /// The raw status/body pair comes back uninterpreted; a 404 for an
    /// unknown DOI is a valid answer, not a transport failure.
    pub async fn get_doi(&self, doi: &Doi) -> Result<RawResponse> {
        let url = self.endpoint_url("getDoi", Some(&doi.to_identifier()))?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_API_CONTENT_TYPE)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(|source| transport_error("getDoi", source))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| transport_error("getDoi", source))?;
        Ok(RawResponse { status, body })
    }

    fn authorization(&self) -> String {
        let raw = format!("{}:{}", self.credentials.username, self.credentials.password);
        format!("Basic {}", BASE64.encode(raw))
    }

    fn endpoint_url(&self, operation: &'static str, id: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port))
            .map_err(|e| DoiClientError::RequestTarget {
                operation,
                message: e.to_string(),
            })?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DoiClientError::RequestTarget {
                    operation,
                    message: format!("cannot-be-a-base url for host {}", self.host),
                })?;
            path.pop_if_empty();
            path.push(DOIS_PATH);
            if let Some(id) = id {
                for part in id.split('/') {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }
}

fn transport_error(operation: &'static str, source: reqwest::Error) -> DoiClientError {
    error!(operation, error = %source, "error during API communication");
    DoiClientError::Transport { operation, source }
}
