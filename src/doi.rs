//! DOI value type
//!
//! A DOI is a `prefix/suffix` pair, renderable either as the bare registry
//! identifier or as a resolvable `https://doi.org/` URI.

use crate::error::{DoiClientError, Result};
use std::fmt;
use url::Url;

const DOI_PROXY: &str = "https://doi.org/";

/// A registry identifier split into prefix and suffix.
///
/// Immutable once constructed; both parts are guaranteed non-empty and the
/// suffix contains no further slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doi {
    prefix: String,
    suffix: String,
}

impl Doi {
    /// Build a DOI from a bare `prefix/suffix` identifier.
    pub fn from_identifier(identifier: &str) -> Result<Self> {
        let trimmed = identifier.trim();
        let (prefix, suffix) = trimmed
            .split_once('/')
            .ok_or_else(|| DoiClientError::InvalidDoi(trimmed.to_string()))?;
        if prefix.is_empty() || suffix.is_empty() || suffix.contains('/') {
            return Err(DoiClientError::InvalidDoi(trimmed.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Build a DOI from a proxy URI such as `https://doi.org/10.5072/abc`.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = Url::parse(uri).map_err(|_| DoiClientError::InvalidDoi(uri.to_string()))?;
        let identifier = parsed.path().trim_start_matches('/');
        Self::from_identifier(identifier)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The bare registry identifier, `prefix/suffix`.
    pub fn to_identifier(&self) -> String {
        format!("{}/{}", self.prefix, self.suffix)
    }

    /// The canonical resolvable form, `https://doi.org/prefix/suffix`.
    pub fn to_uri(&self) -> String {
        format!("{}{}/{}", DOI_PROXY, self.prefix, self.suffix)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}
