//! Drives a real merchant-service HTTP server over a loopback socket,
//! covering the checkout-session lifecycle edge cases that don't require
//! a counterpart shopper service (those live in `e2e-tests`).

use std::net::TcpListener;

use common_enums::{CardNetwork, Currency};
use common_utils::pii::Email;
use domain_types::{
    api::{CreateSessionRequest, LineItemRequest, PaymentMandateWire, UpdateSessionRequest},
    ids::MandateId,
    mandate::{MandateContents, PaymentDetailsAmount, PaymentDetailsTotal, PaymentMandate, PaymentMethodDetails, PaymentResponse},
};
use ring::signature::{Ed25519KeyPair, KeyPair};
use rust_decimal::Decimal;
use serde_json::json;

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind an ephemeral port");
    listener.local_addr().expect("listener has no local address").port()
}

fn config(port: u16, metrics_port: u16) -> merchant_service::configs::Config {
    merchant_service::configs::Config {
        common: merchant_service::configs::Common { environment: "development".to_string() },
        server: merchant_service::configs::Server { host: "127.0.0.1".to_string(), port },
        metrics: merchant_service::configs::MetricsServer { host: "127.0.0.1".to_string(), port: metrics_port },
        log: merchant_service::logger::Log {
            console: merchant_service::logger::ConsoleConfig {
                enabled: false,
                level: merchant_service::logger::LogLevel::Info,
                log_format: merchant_service::logger::LogFormat::Default,
            },
        },
        merchant: merchant_service::configs::Merchant {
            id: "merchant_lifecycle".to_string(),
            name: "Lifecycle Test Store".to_string(),
            url: "https://shop.lifecycle.example".to_string(),
            public_base_url: format!("http://127.0.0.1:{port}"),
            did_signing_endpoint: None,
        },
        risk: merchant_service::configs::RiskConfig {
            step_up_enabled: false,
            threshold_small: 0.0,
            threshold_large: 0.0,
            amount_threshold: Decimal::new(999_999, 2),
        },
    }
}

async fn spawn_merchant() -> String {
    let port = free_port();
    let metrics_port = free_port();
    let cfg = config(port, metrics_port);
    tokio::spawn(async move {
        let _ = merchant_service::app::server_builder(cfg).await;
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    format!("http://127.0.0.1:{port}")
}

async fn create_session(client: &reqwest::Client, base: &str, email: &str) -> serde_json::Value {
    let request = CreateSessionRequest {
        line_items: vec![LineItemRequest {
            sku: "SKU-1".to_string(),
            name: "Gadget".to_string(),
            unit_price: Decimal::new(1999, 2),
            quantity: 1,
        }],
        buyer_email: Email::try_from(email.to_string()).expect("valid test email"),
        currency: Currency::Usd,
    };
    let response = client
        .post(format!("{base}/ucp/v1/checkout-sessions"))
        .json(&request)
        .send()
        .await
        .expect("create session request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.expect("create session response was not valid JSON")
}

fn build_mandate(total: Decimal, email: &str, key_pair: &Ed25519KeyPair) -> PaymentMandate {
    let contents = MandateContents {
        payment_mandate_id: MandateId::generate(),
        timestamp: common_utils::date_time::now(),
        payment_details_id: "pd_lifecycle".to_string(),
        payment_details_total: PaymentDetailsTotal {
            label: "Total".to_string(),
            amount: PaymentDetailsAmount { currency: Currency::Usd, value: total },
        },
        payment_response: PaymentResponse {
            request_id: "req_lifecycle".to_string(),
            method_name: "card".to_string(),
            details: PaymentMethodDetails {
                token: "1234123412341234".to_string(),
                cryptogram: "B".repeat(32),
                card_last_four: "1234".to_string(),
                card_network: CardNetwork::Visa,
            },
            payer_email: Email::try_from(email.to_string()).expect("valid test email"),
            payer_name: "Lifecycle Shopper".to_string(),
        },
        merchant_agent: "merchant_lifecycle".to_string(),
    };
    let canonical = contents.canonical_bytes().expect("mandate contents must canonicalize");
    let signature = key_pair.sign(&canonical).as_ref().to_vec();
    PaymentMandate { contents, user_authorization: signature }
}

#[tokio::test]
async fn create_and_get_round_trip() {
    let base = spawn_merchant().await;
    let client = reqwest::Client::new();

    let created = create_session(&client, &base, "roundtrip@example.com").await;
    let session_id = created["id"].as_str().expect("session id missing");
    assert_eq!(created["status"], json!("incomplete"));

    let fetched = client
        .get(format!("{base}/ucp/v1/checkout-sessions/{session_id}"))
        .send()
        .await
        .expect("get session request failed")
        .json::<serde_json::Value>()
        .await
        .expect("get session response was not valid JSON");
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["total"], created["total"]);
}

#[tokio::test]
async fn unknown_session_returns_not_found() {
    let base = spawn_merchant().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/ucp/v1/checkout-sessions/sess_does_not_exist"))
        .send()
        .await
        .expect("get session request failed");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.expect("error response was not valid JSON");
    assert_eq!(body["error_kind"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn complete_without_an_attached_mandate_is_rejected() {
    let base = spawn_merchant().await;
    let client = reqwest::Client::new();

    let session = create_session(&client, &base, "no-mandate@example.com").await;
    let session_id = session["id"].as_str().expect("session id missing");

    let response = client
        .post(format!("{base}/ucp/v1/checkout-sessions/{session_id}/complete"))
        .send()
        .await
        .expect("complete request failed");
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.expect("error response was not valid JSON");
    assert_eq!(body["error_kind"], json!("INVALID_STATE"));
}

#[tokio::test]
async fn update_after_completion_is_rejected_as_invalid_state() {
    let base = spawn_merchant().await;
    let client = reqwest::Client::new();

    let email = "already-complete@example.com";
    let key_pair = Ed25519KeyPair::from_pkcs8(Ed25519KeyPair::generate_pkcs8(&ring::rand::SystemRandom::new()).unwrap().as_ref()).unwrap();
    client
        .post(format!("{base}/ucp/v1/device-credentials"))
        .json(&json!({ "email": email, "public_key": common_utils::b64::encode(key_pair.public_key().as_ref()) }))
        .send()
        .await
        .expect("device-credential registration failed");

    let session = create_session(&client, &base, email).await;
    let session_id = session["id"].as_str().expect("session id missing").to_string();
    let total = Decimal::from_f64_retain(session["total"].as_f64().expect("session total missing")).expect("session total out of range");

    let mandate = build_mandate(total, email, &key_pair);
    let update_request = UpdateSessionRequest { mandate: PaymentMandateWire::from(&mandate) };
    client
        .put(format!("{base}/ucp/v1/checkout-sessions/{session_id}"))
        .json(&update_request)
        .send()
        .await
        .expect("update session request failed");

    let complete_response = client
        .post(format!("{base}/ucp/v1/checkout-sessions/{session_id}/complete"))
        .send()
        .await
        .expect("complete request failed");
    let completed: serde_json::Value = complete_response.json().await.expect("complete response was not valid JSON");
    assert_eq!(completed["session"]["status"], json!("complete"));

    // A second mandate, with a fresh id, attached after the session is
    // already terminal must be rejected: Update only allows
    // incomplete/ready_for_complete/requires_escalation as source states.
    let second_mandate = build_mandate(total, email, &key_pair);
    let second_update = UpdateSessionRequest { mandate: PaymentMandateWire::from(&second_mandate) };
    let response = client
        .put(format!("{base}/ucp/v1/checkout-sessions/{session_id}"))
        .json(&second_update)
        .send()
        .await
        .expect("second update request failed");
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.expect("error response was not valid JSON");
    assert_eq!(body["error_kind"], json!("INVALID_STATE"));
}

#[tokio::test]
async fn product_search_respects_the_limit_parameter() {
    let base = spawn_merchant().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/ucp/products/search?limit=1"))
        .send()
        .await
        .expect("product search request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("product search response was not valid JSON");
    let items = body["items"].as_array().expect("items should be an array");
    assert!(items.len() <= 1, "limit=1 should cap the result set, got {items:?}");
}
