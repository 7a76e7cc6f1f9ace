#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests for the on-behalf-of exchange: [`OboExchanger`]
//! against a mock token endpoint, alone and behind the [`TokenBroker`].

use std::sync::Arc;

use httpmock::prelude::*;
use orderhub_auth::broker::{ExchangeError, OboConfig, OboExchanger, TokenExchanger};
use orderhub_auth::{BrokerError, BrokerSettings, TokenBroker};
use orderhub_security::SecurityContext;
use secrecy::{ExposeSecret, SecretString};

fn exchanger_for(server: &MockServer) -> OboExchanger {
    OboExchanger::new(&OboConfig {
        token_endpoint: server.url("/oauth2/token"),
        client_id: "orderhub".to_owned(),
        client_secret: SecretString::from("s3cret".to_owned()),
    })
    .unwrap()
}

fn caller() -> SecurityContext {
    SecurityContext::builder()
        .subject_id("user-42")
        .tenant_id("tenant-a")
        .roles(vec!["Reader".to_owned()])
        .bearer_token("inbound-jwt".to_owned())
        .build()
}

#[tokio::test]
async fn successful_exchange_parses_token_and_expiry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_includes("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer")
                .body_includes("assertion=inbound-jwt")
                .body_includes("requested_token_use=on_behalf_of")
                .body_includes("scope=https%3A%2F%2Finvoices.example%2F.default");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "access_token": "delegated-abc",
                    "token_type": "Bearer",
                    "expires_in": 3600,
                }));
        })
        .await;

    let token = exchanger_for(&server)
        .exchange(
            &SecretString::from("inbound-jwt".to_owned()),
            "https://invoices.example/.default",
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(token.access_token.expose_secret(), "delegated-abc");
    assert_eq!(token.expires_in.whole_seconds(), 3600);
}

#[tokio::test]
async fn provider_rejection_is_not_a_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "error": "invalid_grant",
                    "error_description": "assertion audience mismatch",
                }));
        })
        .await;

    let err = exchanger_for(&server)
        .exchange(&SecretString::from("inbound-jwt".to_owned()), "scope")
        .await
        .unwrap_err();

    match err {
        ExchangeError::Rejected { status, reason } => {
            assert_eq!(status, 400);
            assert!(reason.contains("invalid_grant"));
            assert!(reason.contains("assertion audience mismatch"));
        }
        other => panic!("expected Rejected, got {other}"),
    }
}

#[tokio::test]
async fn server_errors_surface_as_transport() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(503);
        })
        .await;

    let err = exchanger_for(&server)
        .exchange(&SecretString::from("inbound-jwt".to_owned()), "scope")
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Transport(_)));
}

#[tokio::test]
async fn broker_retries_transport_failures_through_the_real_exchanger() {
    let server = MockServer::start_async().await;
    // Every call fails; with a two-attempt budget the endpoint is hit
    // exactly twice before the broker gives up.
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(502);
        })
        .await;

    let broker = TokenBroker::new(
        Arc::new(exchanger_for(&server)),
        BrokerSettings::default(),
    );

    let err = broker.acquire(&caller(), "scope").await.unwrap_err();
    assert!(matches!(err, BrokerError::Transport { .. }));
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn broker_caches_a_delegated_credential_across_acquires() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "access_token": "delegated-abc",
                    "expires_in": 3600,
                }));
        })
        .await;

    let broker = TokenBroker::new(
        Arc::new(exchanger_for(&server)),
        BrokerSettings::default(),
    );
    let ctx = caller();

    let first = broker.acquire(&ctx, "scope").await.unwrap();
    let second = broker.acquire(&ctx, "scope").await.unwrap();

    assert_eq!(
        first.bearer().expose_secret(),
        second.bearer().expose_secret()
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn broker_does_not_retry_a_rejected_grant() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "error": "invalid_grant" }));
        })
        .await;

    let broker = TokenBroker::new(
        Arc::new(exchanger_for(&server)),
        BrokerSettings::default(),
    );

    let err = broker.acquire(&caller(), "scope").await.unwrap_err();
    assert!(matches!(
        err,
        BrokerError::ExchangeRejected { status: 400, .. }
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_success_body_is_a_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(200)
                .header("content-type", "application/json")
                .body("{\"token_type\":\"Bearer\"}");
        })
        .await;

    let err = exchanger_for(&server)
        .exchange(&SecretString::from("inbound-jwt".to_owned()), "scope")
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Rejected { status: 200, .. }));
}
