//! Registry module for DOI registry interactions
//!
//! Scoped authentication, the MDS and REST transports, the connection
//! factory binding them to customers, and the lifecycle client on top.

pub mod auth;
pub mod client;
pub mod connection;
pub mod factory;
pub mod rest;

pub use auth::{AuthenticationProvider, BasicCredentials, CustomerAuthenticator};
pub use client::{DataCiteClient, DoiClient};
pub use connection::{MdsConnection, RawResponse};
pub use factory::MdsConnectionFactory;
pub use rest::{DraftDoiDto, RestConnection};
