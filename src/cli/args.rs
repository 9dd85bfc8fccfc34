//! Command line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "doi-registrar")]
#[command(about = "Mint and maintain DOIs through the DataCite registry APIs")]
#[command(version)]
pub struct Cli {
    /// Registry API hostname (falls back to DOI_REGISTRY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Registry API port (falls back to DOI_REGISTRY_PORT, default 443)
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the customer secret blob, a JSON array of credential records
    /// (falls back to DOI_CUSTOMER_SECRETS_FILE, or the DOI_CUSTOMER_SECRETS
    /// variable holding the blob itself)
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,

    /// Send landing-page registrations as form-urlencoded bodies instead of
    /// the plain-text key/value format
    #[arg(long)]
    pub form_encoded: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mint a draft DOI from a DataCite XML metadata file
    Create {
        /// Customer identifier owning the registry prefix
        customer: String,
        /// File containing the DataCite XML metadata
        metadata_file: PathBuf,
    },
    /// Mint an empty draft DOI through the REST (JSON-API) endpoint
    CreateDraft {
        customer: String,
    },
    /// Mint a DOI and register its landing page in one flow
    CreateFindable {
        customer: String,
        metadata_file: PathBuf,
        /// Landing page URL the DOI should resolve to
        landing_page: String,
    },
    /// Replace the metadata registered for an existing DOI
    UpdateMetadata {
        customer: String,
        /// DOI as prefix/suffix or https://doi.org/ URI
        doi: String,
        metadata_file: PathBuf,
    },
    /// Register or replace the landing page a DOI resolves to
    SetLandingPage {
        customer: String,
        doi: String,
        landing_page: String,
    },
    /// Mark a DOI's metadata inactive
    DeleteMetadata {
        customer: String,
        doi: String,
    },
    /// Delete a DOI that is still a draft
    DeleteDraft {
        customer: String,
        doi: String,
    },
}
