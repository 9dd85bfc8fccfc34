//! Lifecycle tests for the DOI client against a stubbed MDS endpoint.

use doi_registrar::config::{CredentialStore, RegistrySettings, UrlRegistrationFormat};
use doi_registrar::doi::Doi;
use doi_registrar::error::DoiClientError;
use doi_registrar::registry::client::{DataCiteClient, DoiClient};
use doi_registrar::registry::factory::MdsConnectionFactory;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CUSTOMER: &str = "https://api.example.org/customer/cust-1";
const PREFIX: &str = "10.5072";
const METADATA_XML: &str = "<resource/>";
const LANDING_PAGE: &str = "https://nva.example/pub/1";
// base64("user:pass")
const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";

fn secret_blob() -> String {
    format!(
        r#"[{{"customerId": "{CUSTOMER}", "doiPrefix": "{PREFIX}",
             "username": "user", "password": "pass"}}]"#
    )
}

fn client_against(server: &MockServer, format: UrlRegistrationFormat) -> DataCiteClient {
    let address = server.address();
    let store = Arc::new(CredentialStore::from_json(&secret_blob()).unwrap());
    let settings = RegistrySettings::new(address.ip().to_string(), address.port())
        .with_scheme("http")
        .with_url_format(format);
    DataCiteClient::new(MdsConnectionFactory::new(store, settings).unwrap())
}

fn mds_client(server: &MockServer) -> DataCiteClient {
    client_against(server, UrlRegistrationFormat::TextPlain)
}

/// Client whose requests give up after 250 ms, for exercising transport
/// failures against stubs that delay their response past that.
fn impatient_client(server: &MockServer) -> DataCiteClient {
    let address = server.address();
    let store = Arc::new(CredentialStore::from_json(&secret_blob()).unwrap());
    let settings =
        RegistrySettings::new(address.ip().to_string(), address.port()).with_scheme("http");
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(250))
        .build()
        .unwrap();
    DataCiteClient::new(MdsConnectionFactory::with_client(http, store, settings))
}

fn sample_doi() -> Doi {
    Doi::from_identifier("10.5072/xyz").unwrap()
}

#[tokio::test]
async fn create_doi_returns_registry_assigned_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .and(header("authorization", BASIC_AUTH))
        .and(header("content-type", "application/xml; charset=UTF-8"))
        .and(body_string(METADATA_XML))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .expect(1)
        .mount(&server)
        .await;

    let doi = mds_client(&server)
        .create_doi(CUSTOMER, METADATA_XML)
        .await
        .unwrap();
    assert_eq!(doi.prefix(), "10.5072");
    assert_eq!(doi.suffix(), "xyz");
}

#[tokio::test]
async fn create_doi_maps_rejection_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&server)
        .await;

    let error = mds_client(&server)
        .create_doi(CUSTOMER, METADATA_XML)
        .await
        .unwrap_err();
    match error {
        DoiClientError::CreateDoi { prefix, status } => {
            assert_eq!(prefix, PREFIX);
            assert_eq!(status, 400);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_doi_with_unparseable_body_fails_cleanly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK but no identifier"))
        .mount(&server)
        .await;

    let error = mds_client(&server)
        .create_doi(CUSTOMER, METADATA_XML)
        .await
        .unwrap_err();
    assert!(matches!(error, DoiClientError::ResponseParse(_)));
}

#[tokio::test]
async fn create_doi_for_unknown_customer_fails_before_any_request() {
    let server = MockServer::start().await;

    let error = mds_client(&server)
        .create_doi("https://api.example.org/customer/unknown", METADATA_XML)
        .await
        .unwrap_err();
    assert!(matches!(error, DoiClientError::Configuration(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_metadata_for_unknown_customer_fails_at_challenge_time() {
    let server = MockServer::start().await;

    let error = mds_client(&server)
        .update_metadata(
            "https://api.example.org/customer/unknown",
            &sample_doi(),
            METADATA_XML,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, DoiClientError::NoCredentials(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_metadata_posts_to_doi_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072/xyz"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string(METADATA_XML))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    mds_client(&server)
        .update_metadata(CUSTOMER, &sample_doi(), METADATA_XML)
        .await
        .unwrap();
}

#[tokio::test]
async fn set_landing_page_puts_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string(format!(
            "doi=10.5072/xyz\nurl={LANDING_PAGE}"
        )))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    mds_client(&server)
        .set_landing_page(CUSTOMER, &sample_doi(), LANDING_PAGE)
        .await
        .unwrap();
}

#[tokio::test]
async fn set_landing_page_accepts_200_for_replacement() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    mds_client(&server)
        .set_landing_page(CUSTOMER, &sample_doi(), LANDING_PAGE)
        .await
        .unwrap();
}

#[tokio::test]
async fn set_landing_page_supports_form_encoded_variant() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("doi=10.5072%2Fxyz"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    client_against(&server, UrlRegistrationFormat::FormUrlEncoded)
        .set_landing_page(CUSTOMER, &sample_doi(), LANDING_PAGE)
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_draft_doi_on_findable_doi_is_a_terminal_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(405).set_body_string("Method Not Allowed"))
        .mount(&server)
        .await;

    let error = mds_client(&server)
        .delete_draft_doi(CUSTOMER, &sample_doi())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        DoiClientError::DeleteDraftDoi { status: 405, .. }
    ));
    let message = error.to_string();
    assert!(message.contains("10.5072/xyz"));
    assert!(message.contains("405"));
}

#[tokio::test]
async fn delete_metadata_succeeds_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/metadata/10.5072/xyz"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    mds_client(&server)
        .delete_metadata(CUSTOMER, &sample_doi())
        .await
        .unwrap();
}

#[tokio::test]
async fn created_metadata_can_be_read_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(METADATA_XML))
        .mount(&server)
        .await;

    let address = server.address();
    let store = Arc::new(CredentialStore::from_json(&secret_blob()).unwrap());
    let settings =
        RegistrySettings::new(address.ip().to_string(), address.port()).with_scheme("http");
    let factory = MdsConnectionFactory::new(store, settings).unwrap();
    let client = DataCiteClient::new(factory.clone());

    let doi = client.create_doi(CUSTOMER, METADATA_XML).await.unwrap();
    let response = factory
        .authenticated_connection(CUSTOMER)
        .get_metadata(&doi.to_identifier())
        .await
        .unwrap();
    assert!(response.is_success());
    assert_eq!(response.body, METADATA_XML);
}

#[tokio::test]
async fn registered_landing_page_can_be_read_back() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doi/10.5072/xyz"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let address = server.address();
    let store = Arc::new(CredentialStore::from_json(&secret_blob()).unwrap());
    let settings =
        RegistrySettings::new(address.ip().to_string(), address.port()).with_scheme("http");
    let factory = MdsConnectionFactory::new(store, settings).unwrap();
    let client = DataCiteClient::new(factory.clone());

    let doi = sample_doi();
    client
        .set_landing_page(CUSTOMER, &doi, LANDING_PAGE)
        .await
        .unwrap();
    let response = factory
        .authenticated_connection(CUSTOMER)
        .get_doi(&doi.to_identifier())
        .await
        .unwrap();
    assert!(response.is_success());
    assert_eq!(response.body, LANDING_PAGE);
}

#[tokio::test]
async fn findable_flow_rolls_back_metadata_when_url_registration_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metadata/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let error = mds_client(&server)
        .create_findable_doi(CUSTOMER, METADATA_XML, LANDING_PAGE)
        .await
        .unwrap_err();
    // Rollback succeeded, so the original failure is what surfaces.
    assert!(matches!(
        error,
        DoiClientError::SetLandingPage { status: 500, .. }
    ));
}

#[tokio::test]
async fn findable_flow_surfaces_orphaned_draft_when_rollback_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metadata/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(500).set_body_string("still boom"))
        .mount(&server)
        .await;

    let error = mds_client(&server)
        .create_findable_doi(CUSTOMER, METADATA_XML, LANDING_PAGE)
        .await
        .unwrap_err();
    match error {
        DoiClientError::OrphanedDraft {
            doi,
            register_status,
            delete_status,
        } => {
            assert_eq!(doi.to_identifier(), "10.5072/xyz");
            assert_eq!(register_status, Some(500));
            assert_eq!(delete_status, Some(500));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn findable_flow_rolls_back_metadata_when_url_registration_breaks_in_transit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .mount(&server)
        .await;
    // Delayed past the client's request timeout, so the PUT dies in transit.
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metadata/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let error = impatient_client(&server)
        .create_findable_doi(CUSTOMER, METADATA_XML, LANDING_PAGE)
        .await
        .unwrap_err();
    // Rollback succeeded, so the transport failure is what surfaces.
    assert!(matches!(
        error,
        DoiClientError::Transport {
            operation: "registerUrl",
            ..
        }
    ));
}

#[tokio::test]
async fn findable_flow_surfaces_orphan_when_registration_breaks_and_rollback_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metadata/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let error = impatient_client(&server)
        .create_findable_doi(CUSTOMER, METADATA_XML, LANDING_PAGE)
        .await
        .unwrap_err();
    match error {
        DoiClientError::OrphanedDraft {
            doi,
            register_status,
            delete_status,
        } => {
            assert_eq!(doi.to_identifier(), "10.5072/xyz");
            assert_eq!(register_status, None);
            assert_eq!(delete_status, Some(500));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn findable_flow_succeeds_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metadata/10.5072"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK (10.5072/xyz)"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/doi/10.5072/xyz"))
        .respond_with(ResponseTemplate::new(201).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let doi = mds_client(&server)
        .create_findable_doi(CUSTOMER, METADATA_XML, LANDING_PAGE)
        .await
        .unwrap();
    assert_eq!(doi.to_identifier(), "10.5072/xyz");
}
