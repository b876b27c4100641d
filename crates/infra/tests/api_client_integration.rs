//! Integration tests for the request pipeline
//!
//! **Coverage:**
//! - Cross-format decode: JSON response into a typed result, with or
//!   without a byte order mark
//! - Status classification: 400 fragment extraction, 404 raw body
//! - Create, revision, delete and raw-document operations
//! - Tagged dispatch over heterogeneous links
//! - Refused connections: retried, then `TransportExhausted`
//!
//! **Infrastructure:**
//! - WireMock HTTP server (simulates the PayRun API)
//! - Real `ReqwestTransport`, driven from `spawn_blocking`

use std::net::TcpListener;

use chrono::NaiveDate;
use payrun_domain::{ClientConfig, Credentials, EndpointConfig, PayRunError, RetryConfig};
use payrun_infra::{linked_resource, ApiClient};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Employer")]
struct Employer {
    #[serde(rename = "@Name")]
    name: String,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename = "SalaryPayInstruction")]
struct SalaryPayInstruction {
    #[serde(rename = "AnnualSalary")]
    annual_salary: String,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename = "TaxPayInstruction")]
struct TaxPayInstruction {
    #[serde(rename = "TaxCode")]
    tax_code: String,
}

linked_resource! {
    #[derive(Debug, PartialEq)]
    enum PayInstruction {
        Salary(SalaryPayInstruction) => "SalaryPayInstruction",
        Tax(TaxPayInstruction) => "TaxPayInstruction",
    }
}

fn test_config(base_url: &str) -> ClientConfig {
    let credentials = Credentials::new("key", "secret");
    let mut config = ClientConfig::new(credentials, EndpointConfig::new(base_url));
    config.retry = RetryConfig { max_attempts: 3, base_delay_ms: 1, max_delay_ms: 4 };
    config
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run blocking client code off the async runtime.
async fn blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
    init_tracing();
    tokio::task::spawn_blocking(work).await.expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_response_decodes_into_typed_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Employer/123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"Employer":{"@Name":"Acme"}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let employer = blocking(move || {
        let client = ApiClient::new(config).expect("client");
        client.get::<Employer>("/Employer/123")
    })
    .await
    .expect("employer");

    assert_eq!(employer.name, "Acme");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_response_with_byte_order_mark_decodes() {
    let server = MockServer::start().await;
    let mut body = "\u{feff}".as_bytes().to_vec();
    body.extend_from_slice(br#"{"Employer":{"@Name":"Acme"}}"#);
    Mock::given(method("GET"))
        .and(path("/Employer/ER001"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/json; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let employer = blocking(move || {
        ApiClient::new(config).expect("client").get::<Employer>("/Employer/ER001")
    })
    .await
    .expect("employer");

    assert_eq!(employer, Employer { name: "Acme".into() });
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_carry_oauth_and_negotiation_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER001"))
        .and(header_regex(
            "Authorization",
            concat!(
                r#"^OAuth oauth_consumer_key="key",oauth_signature_method="HMAC-SHA1","#,
                r#"oauth_timestamp="\d+",oauth_nonce="[^"]+",oauth_version="1.0","#,
                r#"oauth_signature="[^"]+"$"#,
            ),
        ))
        .and(header("Accept", "application/xml"))
        .and(header("Content-Type", "application/xml"))
        .and(header("Api-Version", "18.19.1.481"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<Employer Name="Acme" />"#, "application/xml"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.endpoint.api_version = Some("18.19.1.481".into());
    let employer = blocking(move || {
        ApiClient::new(config).expect("client").get::<Employer>("/Employer/ER001")
    })
    .await
    .expect("employer");

    assert_eq!(employer, Employer { name: "Acme".into() });
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_request_yields_error_details_fragment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Employers"))
        .respond_with(ResponseTemplate::new(400).set_body_raw(
            r#"<html><body><h1>Bad Request</h1><div id="errorDetails">boom</div>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let (result, status) = blocking(move || {
        let client = ApiClient::new(config).expect("client");
        let result = client.post("/Employers", &Employer { name: "Acme".into() });
        (result, client.last_status())
    })
    .await;

    let message = r#"<div id="errorDetails">boom</div>"#.to_string();
    assert_eq!(result.unwrap_err(), PayRunError::ServerRejected { status: 400, message });
    assert_eq!(status, Some(400));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_yields_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER404"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("Resource not found", "text/plain"))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let error = blocking(move || {
        ApiClient::new(config).expect("client").get::<Employer>("/Employer/ER404")
    })
    .await
    .unwrap_err();

    let message = "Resource not found".to_string();
    assert_eq!(error, PayRunError::ServerRejected { status: 404, message });
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_sends_canonical_xml_and_returns_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Employers"))
        .and(body_string_contains(r#"Name="Acme""#))
        .and(body_string_contains("xmlns:xsi="))
        .respond_with(ResponseTemplate::new(201).set_body_raw(
            r#"<Link Title="Acme" Href="/Employer/ER001" Rel="Employer" TargetType="Employer" />"#,
            "application/xml",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let link = blocking(move || {
        let client = ApiClient::new(config).expect("client");
        client.post("/Employers", &Employer { name: "Acme".into() })
    })
    .await
    .expect("link");

    assert_eq!(link.href, "/Employer/ER001");
    assert_eq!(link.key(), Some("ER001"));
    assert_eq!(link.target_type.as_deref(), Some("Employer"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_many_wraps_items_in_array_root() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Employers"))
        .and(body_string_contains("<ArrayOfEmployer"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                r#"<LinkCollection Title="Employers"><Links>"#,
                r#"<Link Href="/Employer/ER001" /><Link Href="/Employer/ER002" />"#,
                r#"</Links></LinkCollection>"#,
            ),
            "application/xml",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let links = blocking(move || {
        let employers = [Employer { name: "Acme".into() }, Employer { name: "Globex".into() }];
        ApiClient::new(config).expect("client").post_many("/Employers", &employers)
    })
    .await
    .expect("links");

    assert_eq!(links.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_revision_request_appends_date_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER001/2024-04-06"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<Employer Name="Acme (2024)" />"#, "application/xml"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let employer = blocking(move || {
        let date = NaiveDate::from_ymd_opt(2024, 4, 6).expect("valid date");
        let client = ApiClient::new(config).expect("client");
        client.get_at_revision::<Employer>("/Employer/ER001", date)
    })
    .await
    .expect("revision");

    assert_eq!(employer.name, "Acme (2024)");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_discards_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/Employer/ER001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not a document", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let (result, status) = blocking(move || {
        let client = ApiClient::new(config).expect("client");
        (client.delete("/Employer/ER001"), client.last_status())
    })
    .await;

    assert!(result.is_ok());
    assert_eq!(status, Some(200));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_json_is_returned_verbatim() {
    let server = MockServer::start().await;
    let body = r#"{"Report":{"@Key":"PAYSLIP","Lines":{"Line":["1","2"]}}}"#;
    Mock::given(method("GET"))
        .and(path("/Report/PAYSLIP/run"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let text = blocking(move || {
        ApiClient::new(config).expect("client").get_raw_json("/Report/PAYSLIP/run")
    })
    .await
    .expect("raw json");

    assert_eq!(text, body);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_linked_resources_dispatch_on_type_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER001/Employee/EE001/PayInstructions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                r#"<LinkCollection Title="Pay Instructions"><Links>"#,
                r#"<Link Href="/Employer/ER001/Employee/EE001/PayInstruction/TAX001" "#,
                r#"TargetType="TaxPayInstruction" />"#,
                r#"<Link Href="/Employer/ER001/Employee/EE001/PayInstruction/SAL001" />"#,
                r#"</Links></LinkCollection>"#,
            ),
            "application/xml",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER001/Employee/EE001/PayInstruction/TAX001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"TaxPayInstruction":{"TaxCode":"1257L"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Employer/ER001/Employee/EE001/PayInstruction/SAL001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<SalaryPayInstruction><AnnualSalary>32000</AnnualSalary></SalaryPayInstruction>",
            "application/xml",
        ))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let instructions = blocking(move || -> Result<Vec<PayInstruction>, PayRunError> {
        let client = ApiClient::new(config).expect("client");
        let links = client.get_links("/Employer/ER001/Employee/EE001/PayInstructions")?;
        links.iter().map(|link| client.get_linked::<PayInstruction>(link)).collect()
    })
    .await
    .expect("pay instructions");

    assert_eq!(
        instructions,
        vec![
            PayInstruction::Tax(TaxPayInstruction { tax_code: "1257L".into() }),
            PayInstruction::Salary(SalaryPayInstruction { annual_salary: "32000".into() }),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refused_connection_exhausts_attempts() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr")
    };

    let config = test_config(&format!("http://{address}"));
    let (result, status) = blocking(move || {
        let client = ApiClient::new(config).expect("client");
        (client.get::<Employer>("/Employer/ER001"), client.last_status())
    })
    .await;

    match result {
        Err(PayRunError::TransportExhausted { attempts, waited }) => {
            assert_eq!(attempts, 3);
            assert_eq!(waited.as_millis(), 3);
        }
        other => panic!("expected transport exhaustion, got {other:?}"),
    }
    assert_eq!(status, None);
}
