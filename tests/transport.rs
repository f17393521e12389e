//! Tests of the default reqwest transport against a live mock server.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use acme_courier::{Error, HttpRequest, HttpResponse, HttpTransport};

const TIMEOUT: Duration = Duration::from_secs(5);

fn transport() -> acme_courier::transport::ReqwestTransport {
    acme_courier::transport::ReqwestTransport::new("acme-courier-tests/0").unwrap()
}

async fn send(request: HttpRequest) -> Result<HttpResponse, Error> {
    transport().request(request).await
}

#[tokio::test]
async fn get_returns_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/directory"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("replay-nonce", "oFvnlFP1wIhRlYS2jTaXbA")
                .set_body_string(r#"{"newAccount": "a", "newOrder": "o"}"#),
        )
        .mount(&server)
        .await;

    let response = send(HttpRequest::get(
        format!("{}/directory", server.uri()),
        TIMEOUT,
    ))
    .await
    .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.header("replay-nonce"), Some("oFvnlFP1wIhRlYS2jTaXbA"));
    let directory: serde_json::Value = response.json().unwrap();
    assert_eq!(directory["newAccount"], "a");
}

#[tokio::test]
async fn head_carries_the_nonce_header() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(200).insert_header("replay-nonce", "bm9uY2Ux"))
        .expect(1)
        .mount(&server)
        .await;

    let response = send(HttpRequest::head(format!("{}/nonce", server.uri()), TIMEOUT))
        .await
        .unwrap();
    assert_eq!(response.header("replay-nonce"), Some("bm9uY2Ux"));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn post_sends_the_jose_content_type_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/new-order"))
        .and(header("content-type", "application/jose+json"))
        .and(body_string_contains("\"protected\""))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("location", "https://ca.example/order/1")
                .set_body_string("{}"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = send(HttpRequest::post(
        format!("{}/new-order", server.uri()),
        r#"{"protected": "x", "payload": "", "signature": "y"}"#.to_string(),
        acme_courier::JOSE_CONTENT_TYPE,
        TIMEOUT,
    ))
    .await
    .unwrap();

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.location(), Some("https://ca.example/order/1"));
    assert_eq!(
        response.location_required().unwrap(),
        "https://ca.example/order/1"
    );
}

#[tokio::test]
async fn error_statuses_are_returned_not_mapped() {
    // status interpretation belongs to the protocol engine
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let response = send(HttpRequest::get(server.uri(), TIMEOUT)).await.unwrap();
    assert_eq!(response.status.as_u16(), 503);
    assert_eq!(&response.body[..], b"busy");
}

#[tokio::test]
async fn slow_responses_map_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let err = send(HttpRequest::get(server.uri(), Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn unreachable_servers_map_to_connect() {
    // nothing listens on port 1
    let err = send(HttpRequest::get("http://127.0.0.1:1/directory", TIMEOUT))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connect(_)));
}
