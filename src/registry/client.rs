//! DOI lifecycle client towards the DataCite registry
//!
//! [`DataCiteClient`] implements the logical operations on top of the MDS
//! primitives: it resolves the customer's prefix, interprets status codes
//! into the typed error taxonomy, and extracts registry-assigned identifiers
//! from response bodies.
//!
//! There are no automatic retries anywhere in this layer. Registry
//! operations are not naively idempotent (re-posting a metadata create mints
//! a second identifier), so every failure is surfaced for a caller-side
//! policy decision.

use crate::doi::Doi;
use crate::error::{DoiClientError, Result};
use crate::registry::connection::MdsConnection;
use crate::registry::factory::MdsConnectionFactory;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// The logical DOI operations offered to the rest of the system.
///
/// One registry exchange per call (two for the findable flow); each call is
/// a fresh attempt with no state carried over.
#[async_trait]
pub trait DoiClient {
    /// Mint a draft DOI under the customer's prefix from the given DataCite
    /// XML and return the registry-assigned identifier.
    async fn create_doi(&self, customer_id: &str, metadata_xml: &str) -> Result<Doi>;

    /// Replace the metadata registered for an existing DOI.
    async fn update_metadata(&self, customer_id: &str, doi: &Doi, metadata_xml: &str)
        -> Result<()>;

    /// Register or replace the landing page the DOI resolves to. This is
    /// what moves a draft towards findable.
    async fn set_landing_page(&self, customer_id: &str, doi: &Doi, landing_page: &str)
        -> Result<()>;

    /// Mark the DOI's metadata inactive.
    async fn delete_metadata(&self, customer_id: &str, doi: &Doi) -> Result<()>;

    /// Delete a DOI that is still in draft state. A 405 from the registry
    /// means the DOI has become findable and can no longer be deleted; that
    /// outcome is terminal, not retryable.
    async fn delete_draft_doi(&self, customer_id: &str, doi: &Doi) -> Result<()>;
}

/// `DoiClient` implementation towards the DataCite MDS API.
#[derive(Debug, Clone)]
pub struct DataCiteClient {
    factory: MdsConnectionFactory,
}

impl DataCiteClient {
    pub fn new(factory: MdsConnectionFactory) -> Self {
        Self { factory }
    }

    fn connection(&self, customer_id: &str) -> MdsConnection {
        self.factory.authenticated_connection(customer_id)
    }

    /// The customer's registry prefix, or a configuration error before any
    /// network call is attempted.
    fn customer_prefix(&self, customer_id: &str) -> Result<String> {
        self.factory
            .credential_store()
            .get(customer_id)
            .and_then(|config| config.doi_prefix.clone())
            .ok_or_else(|| DoiClientError::Configuration(customer_id.to_string()))
    }

    /// Create a DOI and register its landing page in one flow.
    ///
    /// The two registry calls are not atomic. When URL registration fails,
    /// whether the registry rejected it or the exchange itself broke, one
    /// best-effort delete of the fresh metadata is attempted; if that also
    /// fails the orphaned draft is logged and surfaced as
    /// [`DoiClientError::OrphanedDraft`]; it is never retried.
    pub async fn create_findable_doi(
        &self,
        customer_id: &str,
        metadata_xml: &str,
        landing_page: &str,
    ) -> Result<Doi> {
        let doi = self.create_doi(customer_id, metadata_xml).await?;
        match self.set_landing_page(customer_id, &doi, landing_page).await {
            Ok(()) => Ok(doi),
            Err(
                original @ (DoiClientError::SetLandingPage { .. }
                | DoiClientError::Transport {
                    operation: "registerUrl",
                    ..
                }),
            ) => {
                warn!(%doi, error = %original, "landing page registration failed, rolling back metadata");
                self.compensate_failed_url_registration(customer_id, doi, original)
                    .await
            }
            Err(other) => Err(other),
        }
    }

    /// Roll back the freshly created metadata after `original` stopped the
    /// landing page registration. On rollback success the original failure
    /// surfaces unchanged; otherwise both failures are folded into
    /// `OrphanedDraft`.
    async fn compensate_failed_url_registration(
        &self,
        customer_id: &str,
        doi: Doi,
        original: DoiClientError,
    ) -> Result<Doi> {
        let identifier = doi.to_identifier();
        let delete_status = match self
            .connection(customer_id)
            .delete_metadata(&identifier)
            .await
        {
            Ok(response) if response.is_success() => {
                info!(%doi, "rolled back metadata after failed landing page registration");
                return Err(original);
            }
            Ok(response) => Some(response.status),
            Err(_) => None,
        };
        let register_status = original.status();
        error!(
            %doi,
            ?register_status,
            ?delete_status,
            "error setting DOI url, error deleting metadata"
        );
        Err(DoiClientError::OrphanedDraft {
            doi,
            register_status,
            delete_status,
        })
    }
}

#[async_trait]
impl DoiClient for DataCiteClient {
    async fn create_doi(&self, customer_id: &str, metadata_xml: &str) -> Result<Doi> {
        let prefix = self.customer_prefix(customer_id)?;
        let response = self
            .connection(customer_id)
            .post_metadata(&prefix, metadata_xml)
            .await?;
        if !response.is_success() {
            error!(
                prefix,
                status = response.status,
                "error creating new DOI with metadata"
            );
            return Err(DoiClientError::CreateDoi {
                prefix,
                status: response.status,
            });
        }
        extract_doi(&response.body)
    }

    async fn update_metadata(
        &self,
        customer_id: &str,
        doi: &Doi,
        metadata_xml: &str,
    ) -> Result<()> {
        let response = self
            .connection(customer_id)
            .post_metadata(&doi.to_identifier(), metadata_xml)
            .await?;
        if !response.is_success() {
            error!(%doi, status = response.status, "error updating metadata for DOI");
            return Err(DoiClientError::UpdateMetadata {
                doi: doi.clone(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn set_landing_page(
        &self,
        customer_id: &str,
        doi: &Doi,
        landing_page: &str,
    ) -> Result<()> {
        let response = self
            .connection(customer_id)
            .register_url(&doi.to_identifier(), landing_page)
            .await?;
        if !response.is_success() {
            error!(%doi, status = response.status, "error setting DOI url");
            return Err(DoiClientError::SetLandingPage {
                doi: doi.clone(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn delete_metadata(&self, customer_id: &str, doi: &Doi) -> Result<()> {
        let response = self
            .connection(customer_id)
            .delete_metadata(&doi.to_identifier())
            .await?;
        if !response.is_success() {
            error!(%doi, status = response.status, "error deleting DOI metadata");
            return Err(DoiClientError::DeleteMetadata {
                doi: doi.clone(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn delete_draft_doi(&self, customer_id: &str, doi: &Doi) -> Result<()> {
        let response = self
            .connection(customer_id)
            .delete_doi(&doi.to_identifier())
            .await?;
        if !response.is_success() {
            // 405 tells the caller the DOI is findable, not draft.
            error!(%doi, status = response.status, "error deleting DOI");
            return Err(DoiClientError::DeleteDraftDoi {
                doi: doi.clone(),
                status: response.status,
            });
        }
        Ok(())
    }
}

/// Pull the registry-assigned identifier out of an MDS create response.
///
/// The body is free text containing the identifier in parentheses, e.g.
/// `OK (10.5072/abc123)`.
fn extract_doi(body: &str) -> Result<Doi> {
    let identifier = body
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(identifier, _)| identifier)
        .ok_or_else(|| DoiClientError::ResponseParse(body.to_string()))?;
    Doi::from_identifier(identifier)
}
