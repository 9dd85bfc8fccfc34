//! Command execution
//!
//! Resolves configuration from flags and environment at the process edge,
//! builds the client, and dispatches the requested operation. Components
//! below this layer never read the environment themselves.

use crate::cli::args::{Cli, Commands};
use crate::config::{CredentialStore, RegistrySettings, UrlRegistrationFormat};
use crate::doi::Doi;
use crate::registry::client::{DataCiteClient, DoiClient};
use crate::registry::factory::MdsConnectionFactory;
use anyhow::{Context, bail};
use std::env;
use std::path::Path;
use std::sync::Arc;

const ENV_REGISTRY_HOST: &str = "DOI_REGISTRY_HOST";
const ENV_REGISTRY_PORT: &str = "DOI_REGISTRY_PORT";
const ENV_CUSTOMER_SECRETS: &str = "DOI_CUSTOMER_SECRETS";
const ENV_CUSTOMER_SECRETS_FILE: &str = "DOI_CUSTOMER_SECRETS_FILE";

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = resolve_settings(&cli)?;
    let store = Arc::new(load_credential_store(&cli)?);
    let factory = MdsConnectionFactory::new(store, settings)?;
    let client = DataCiteClient::new(factory.clone());

    match cli.command {
        Commands::Create {
            customer,
            metadata_file,
        } => {
            let metadata = read_metadata(&metadata_file)?;
            let doi = client.create_doi(&customer, &metadata).await?;
            println!("{doi}");
        }
        Commands::CreateDraft { customer } => {
            let doi = factory.rest_connection(&customer)?.create_draft_doi().await?;
            println!("{doi}");
        }
        Commands::CreateFindable {
            customer,
            metadata_file,
            landing_page,
        } => {
            let metadata = read_metadata(&metadata_file)?;
            let doi = client
                .create_findable_doi(&customer, &metadata, &landing_page)
                .await?;
            println!("{doi}");
        }
        Commands::UpdateMetadata {
            customer,
            doi,
            metadata_file,
        } => {
            let doi = parse_doi(&doi)?;
            let metadata = read_metadata(&metadata_file)?;
            client.update_metadata(&customer, &doi, &metadata).await?;
            println!("updated metadata for {doi}");
        }
        Commands::SetLandingPage {
            customer,
            doi,
            landing_page,
        } => {
            let doi = parse_doi(&doi)?;
            client
                .set_landing_page(&customer, &doi, &landing_page)
                .await?;
            println!("registered {landing_page} for {doi}");
        }
        Commands::DeleteMetadata { customer, doi } => {
            let doi = parse_doi(&doi)?;
            client.delete_metadata(&customer, &doi).await?;
            println!("deleted metadata for {doi}");
        }
        Commands::DeleteDraft { customer, doi } => {
            let doi = parse_doi(&doi)?;
            client.delete_draft_doi(&customer, &doi).await?;
            println!("deleted draft {doi}");
        }
    }
    Ok(())
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<RegistrySettings> {
    let host = match &cli.host {
        Some(host) => host.clone(),
        None => env::var(ENV_REGISTRY_HOST)
            .with_context(|| format!("--host not given and {ENV_REGISTRY_HOST} not set"))?,
    };
    let port = match cli.port {
        Some(port) => port,
        None => match env::var(ENV_REGISTRY_PORT) {
            Ok(value) => value
                .parse()
                .with_context(|| format!("{ENV_REGISTRY_PORT} is not a valid port: {value}"))?,
            Err(_) => 443,
        },
    };
    let format = if cli.form_encoded {
        UrlRegistrationFormat::FormUrlEncoded
    } else {
        UrlRegistrationFormat::TextPlain
    };
    Ok(RegistrySettings::new(host, port).with_url_format(format))
}

fn load_credential_store(cli: &Cli) -> anyhow::Result<CredentialStore> {
    let blob = if let Some(path) = &cli.secrets_file {
        read_secret_file(path)?
    } else if let Ok(path) = env::var(ENV_CUSTOMER_SECRETS_FILE) {
        read_secret_file(Path::new(&path))?
    } else if let Ok(blob) = env::var(ENV_CUSTOMER_SECRETS) {
        blob
    } else {
        bail!(
            "no customer secrets: give --secrets-file or set \
             {ENV_CUSTOMER_SECRETS_FILE} or {ENV_CUSTOMER_SECRETS}"
        );
    };
    CredentialStore::from_json(&blob).context("could not parse customer secret blob")
}

fn read_secret_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("could not read secrets file {}", path.display()))
}

fn read_metadata(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("could not read metadata file {}", path.display()))
}

/// Accept a DOI either as `prefix/suffix` or as a `https://doi.org/` URI.
fn parse_doi(input: &str) -> anyhow::Result<Doi> {
    let doi = if input.starts_with("http://") || input.starts_with("https://") {
        Doi::from_uri(input)?
    } else {
        Doi::from_identifier(input)?
    };
    Ok(doi)
}
