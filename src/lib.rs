//! DOI Registrar Library
//!
//! Client library for minting and maintaining DOIs through the DataCite
//! registry APIs, with per-customer credential resolution and a typed error
//! taxonomy. The `doi-registrar` binary in this crate drives the same
//! operations from the command line.

pub mod cli;
pub mod config;
pub mod doi;
pub mod error;
pub mod registry;

pub use config::{CredentialStore, RegistrySettings, UrlRegistrationFormat};
pub use doi::Doi;
pub use error::{DoiClientError, Result};
pub use registry::{DataCiteClient, DoiClient, MdsConnectionFactory};
