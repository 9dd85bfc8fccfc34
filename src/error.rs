//! Error taxonomy for DOI registry operations
//!
//! Non-2xx registry answers map onto one typed variant per logical operation,
//! each carrying the DOI (or prefix, for create) and the status code.
//! Transport failures are wrapped with the name of the operation that was in
//! flight so callers never see a raw `reqwest` error.

use crate::doi::Doi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DoiClientError>;

#[derive(Error, Debug)]
pub enum DoiClientError {
    /// Customer has no usable credential record; raised before any network call.
    #[error("customer {0} has no registry configuration")]
    Configuration(String),

    /// Credentials were demanded for a customer with none stored.
    #[error("no registry credentials stored for customer {0}")]
    NoCredentials(String),

    #[error("error creating new DOI with metadata: {prefix} ({status})")]
    CreateDoi { prefix: String, status: u16 },

    #[error("error updating metadata for DOI: {doi} ({status})")]
    UpdateMetadata { doi: Doi, status: u16 },

    #[error("error setting DOI url: {doi} ({status})")]
    SetLandingPage { doi: Doi, status: u16 },

    #[error("error deleting DOI metadata: {doi} ({status})")]
    DeleteMetadata { doi: Doi, status: u16 },

    /// A 405 here means the DOI is findable and no longer deletable.
    #[error("error deleting DOI: {doi} ({status})")]
    DeleteDraftDoi { doi: Doi, status: u16 },

    /// Landing-page registration failed and the compensating metadata delete
    /// failed too; the draft DOI is left behind for operator cleanup.
    /// Either status is `None` when that exchange failed at transport level
    /// instead of being rejected by the registry.
    #[error("error setting DOI url, error deleting metadata: {doi}")]
    OrphanedDraft {
        doi: Doi,
        register_status: Option<u16>,
        delete_status: Option<u16>,
    },

    #[error("could not serialize request body for {operation}")]
    RequestBody {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request target for {operation}: {message}")]
    RequestTarget {
        operation: &'static str,
        message: String,
    },

    #[error("error during API communication: ({operation})")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not extract DOI from registry response: {0:?}")]
    ResponseParse(String),

    #[error("not a valid DOI: {0}")]
    InvalidDoi(String),

    #[error("could not parse customer configuration: {0}")]
    ConfigLoad(#[from] serde_json::Error),
}

impl DoiClientError {
    /// Status code of the registry answer, when this failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::CreateDoi { status, .. }
            | Self::UpdateMetadata { status, .. }
            | Self::SetLandingPage { status, .. }
            | Self::DeleteMetadata { status, .. }
            | Self::DeleteDraftDoi { status, .. } => Some(*status),
            _ => None,
        }
    }
}
