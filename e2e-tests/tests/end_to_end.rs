//! Drives both services over real HTTP sockets, the way an integration
//! harness would against a deployed UCP merchant and its companion
//! shopper agent. No mocks: every assertion below crosses the wire.

use std::{net::TcpListener, time::Duration};

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

fn merchant_config(port: u16, metrics_port: u16, step_up_enabled: bool, threshold_small: f64, amount_threshold: Decimal) -> merchant_service::configs::Config {
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
            id: "merchant_e2e".to_string(),
            name: "End To End Store".to_string(),
            url: "https://shop.e2e.example".to_string(),
            public_base_url: format!("http://127.0.0.1:{port}"),
            did_signing_endpoint: None,
        },
        risk: merchant_service::configs::RiskConfig {
            step_up_enabled,
            threshold_small,
            threshold_large: 0.30,
            amount_threshold,
        },
    }
}

fn shopper_config(port: u16, metrics_port: u16, merchant_port: u16) -> shopper_service::configs::Config {
    shopper_service::configs::Config {
        common: shopper_service::configs::Common { environment: "development".to_string() },
        server: shopper_service::configs::Server { host: "127.0.0.1".to_string(), port },
        metrics: shopper_service::configs::MetricsServer { host: "127.0.0.1".to_string(), port: metrics_port },
        log: shopper_service::logger::Log {
            console: shopper_service::logger::ConsoleConfig {
                enabled: false,
                level: shopper_service::logger::LogLevel::Info,
                log_format: shopper_service::logger::LogFormat::Default,
            },
        },
        shopper: shopper_service::configs::Shopper {
            merchant_discovery_url: format!("http://127.0.0.1:{merchant_port}/.well-known/ucp"),
            pan_encryption_key: masking::Secret::new(common_utils::b64::encode([7u8; 32])),
            device_origin: "https://shopper-e2e.example".to_string(),
            call_timeout_secs: 5,
        },
        tokenization: shopper_service::configs::Tokenization {
            enabled: false,
            consumer_key: String::new(),
            private_key: None,
            tokenize_url: None,
            authenticate_url: None,
            verify_url: None,
            call_timeout_secs: 5,
        },
    }
}

/// Spins up a merchant and a shopper service on ephemeral ports and
/// returns their base URLs once both are accepting connections.
async fn spawn_services(step_up_enabled: bool, threshold_small: f64, amount_threshold: Decimal) -> (String, String) {
    let merchant_port = free_port();
    let merchant_metrics_port = free_port();
    let shopper_port = free_port();
    let shopper_metrics_port = free_port();

    let merchant_cfg = merchant_config(merchant_port, merchant_metrics_port, step_up_enabled, threshold_small, amount_threshold);
    tokio::spawn(async move {
        let _ = merchant_service::app::server_builder(merchant_cfg).await;
    });

    let shopper_cfg = shopper_config(shopper_port, shopper_metrics_port, merchant_port);
    tokio::spawn(async move {
        let _ = shopper_service::app::server_builder(shopper_cfg).await;
    });

    // Both servers bind their listener before accepting any request; a
    // short settle avoids a thundering first-request 111 on slow CI hosts.
    tokio::time::sleep(Duration::from_millis(200)).await;

    (format!("http://127.0.0.1:{merchant_port}"), format!("http://127.0.0.1:{shopper_port}"))
}

async fn enroll(client: &reqwest::Client, shopper_base: &str, email: &str) -> serde_json::Value {
    let response = client
        .post(format!("{shopper_base}/shopper/v1/enroll"))
        .json(&json!({
            "email": email,
            "display_name": "E2E Shopper",
            "pan": "4242424242424242",
            "expiry": "12/30",
            "network": "visa",
        }))
        .send()
        .await
        .expect("enroll request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK, "enroll should succeed");
    response.json().await.expect("enroll response was not valid JSON")
}

#[tokio::test]
async fn happy_path_without_step_up() {
    let (_merchant_base, shopper_base) = spawn_services(false, 0.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    let enrollment = enroll(&client, &shopper_base, "no-stepup@example.com").await;
    assert_eq!(enrollment["is_tokenized"], json!(false));

    let prepare_response = client
        .post(format!("{shopper_base}/shopper/v1/purchase/prepare"))
        .json(&json!({
            "email": "no-stepup@example.com",
            "line_items": [{ "sku": "PROD-001", "name": "Widget", "unit_price": 9.99, "quantity": 2 }],
            "currency": "USD",
        }))
        .send()
        .await
        .expect("prepare request failed");
    assert_eq!(prepare_response.status(), reqwest::StatusCode::OK);
    let prepared: serde_json::Value = prepare_response.json().await.expect("prepare response was not valid JSON");
    let session_id = prepared["session_id"].as_str().expect("session_id missing").to_string();

    let confirm_response = client
        .post(format!("{shopper_base}/shopper/v1/purchase/confirm"))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .expect("confirm request failed");
    assert_eq!(confirm_response.status(), reqwest::StatusCode::OK);
    let confirmed: serde_json::Value = confirm_response.json().await.expect("confirm response was not valid JSON");
    assert_eq!(confirmed["status"], json!("success"), "expected a success outcome, got {confirmed}");
    assert!(confirmed["receipt"]["network_reference"].as_str().is_some());
}

#[tokio::test]
async fn step_up_required_then_completes_with_valid_otp() {
    // threshold_small = 1.0 forces every mandate down the step-up branch,
    // regardless of its randomly generated mandate id.
    let (_merchant_base, shopper_base) = spawn_services(true, 1.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    enroll(&client, &shopper_base, "stepup@example.com").await;

    let prepared: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/prepare"))
        .json(&json!({
            "email": "stepup@example.com",
            "line_items": [{ "sku": "PROD-001", "name": "Widget", "unit_price": 9.99, "quantity": 2 }],
            "currency": "USD",
        }))
        .send()
        .await
        .expect("prepare request failed")
        .json()
        .await
        .expect("prepare response was not valid JSON");
    let session_id = prepared["session_id"].as_str().expect("session_id missing").to_string();

    let confirmed: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/confirm"))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .expect("confirm request failed")
        .json()
        .await
        .expect("confirm response was not valid JSON");
    assert_eq!(confirmed["status"], json!("otp_required"), "expected a step-up challenge, got {confirmed}");

    let resolved: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/submit-otp"))
        .json(&json!({ "session_id": session_id, "code": common_utils::consts::DEMO_OTP_CODE }))
        .send()
        .await
        .expect("submit-otp request failed")
        .json()
        .await
        .expect("submit-otp response was not valid JSON");
    assert_eq!(resolved["status"], json!("success"), "expected the OTP to resolve the purchase, got {resolved}");
}

#[tokio::test]
async fn step_up_exhausts_after_three_wrong_codes() {
    let (_merchant_base, shopper_base) = spawn_services(true, 1.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    enroll(&client, &shopper_base, "wrong-otp@example.com").await;

    let prepared: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/prepare"))
        .json(&json!({
            "email": "wrong-otp@example.com",
            "line_items": [{ "sku": "PROD-001", "name": "Widget", "unit_price": 9.99, "quantity": 2 }],
            "currency": "USD",
        }))
        .send()
        .await
        .expect("prepare request failed")
        .json()
        .await
        .expect("prepare response was not valid JSON");
    let session_id = prepared["session_id"].as_str().expect("session_id missing").to_string();

    let confirmed: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/confirm"))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .expect("confirm request failed")
        .json()
        .await
        .expect("confirm response was not valid JSON");
    assert_eq!(confirmed["status"], json!("otp_required"), "expected a step-up challenge, got {confirmed}");

    for _ in 0..2 {
        let rejected: serde_json::Value = client
            .post(format!("{shopper_base}/shopper/v1/purchase/submit-otp"))
            .json(&json!({ "session_id": session_id, "code": "000000" }))
            .send()
            .await
            .expect("submit-otp request failed")
            .json()
            .await
            .expect("submit-otp response was not valid JSON");
        assert_eq!(rejected["status"], json!("invalid_otp"), "wrong code should not be accepted, got {rejected}");
    }

    let exhausted: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/submit-otp"))
        .json(&json!({ "session_id": session_id, "code": "000000" }))
        .send()
        .await
        .expect("submit-otp request failed")
        .json()
        .await
        .expect("submit-otp response was not valid JSON");
    assert_eq!(exhausted["status"], json!("failed"), "third wrong code should exhaust the challenge, got {exhausted}");
    assert!(
        exhausted["message"].as_str().unwrap_or_default().starts_with("CHALLENGE_EXHAUSTED"),
        "expected a CHALLENGE_EXHAUSTED failure, got {exhausted}"
    );
}

fn build_mandate(total: Decimal, currency: Currency, payer_email: &str, key_pair: &Ed25519KeyPair) -> PaymentMandate {
    let contents = MandateContents {
        payment_mandate_id: MandateId::generate(),
        timestamp: common_utils::date_time::now(),
        payment_details_id: "pd_e2e".to_string(),
        payment_details_total: PaymentDetailsTotal {
            label: "Total".to_string(),
            amount: PaymentDetailsAmount { currency, value: total },
        },
        payment_response: PaymentResponse {
            request_id: "req_e2e".to_string(),
            method_name: "card".to_string(),
            details: PaymentMethodDetails {
                token: "1111222233334444".to_string(),
                cryptogram: "A".repeat(32),
                card_last_four: "4444".to_string(),
                card_network: CardNetwork::Visa,
            },
            payer_email: Email::try_from(payer_email.to_string()).expect("valid test email"),
            payer_name: "E2E Shopper".to_string(),
        },
        merchant_agent: "merchant_e2e".to_string(),
    };
    let canonical = contents.canonical_bytes().expect("mandate contents must canonicalize");
    let signature = key_pair.sign(&canonical).as_ref().to_vec();
    PaymentMandate { contents, user_authorization: signature }
}

async fn create_merchant_session(client: &reqwest::Client, merchant_base: &str, email: &str) -> serde_json::Value {
    let request = CreateSessionRequest {
        line_items: vec![LineItemRequest {
            sku: "PROD-001".to_string(),
            name: "Widget".to_string(),
            unit_price: Decimal::new(999, 2),
            quantity: 2,
        }],
        buyer_email: Email::try_from(email.to_string()).expect("valid test email"),
        currency: Currency::Usd,
    };
    let response = client
        .post(format!("{merchant_base}/ucp/v1/checkout-sessions"))
        .json(&request)
        .send()
        .await
        .expect("create session request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.expect("create session response was not valid JSON")
}

#[tokio::test]
async fn forged_signature_fails_at_complete() {
    let (merchant_base, _shopper_base) = spawn_services(false, 0.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    let email = "forged@example.com";
    let registered_key = Ed25519KeyPair::from_pkcs8(Ed25519KeyPair::generate_pkcs8(&ring::rand::SystemRandom::new()).unwrap().as_ref()).unwrap();
    let registered_public_key = registered_key.public_key().as_ref().to_vec();
    let response = client
        .post(format!("{merchant_base}/ucp/v1/device-credentials"))
        .json(&json!({ "email": email, "public_key": common_utils::b64::encode(&registered_public_key) }))
        .send()
        .await
        .expect("device-credential registration failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let session = create_merchant_session(&client, &merchant_base, email).await;
    let session_id = session["id"].as_str().expect("session id missing").to_string();
    let total = Decimal::from_f64_retain(session["total"].as_f64().expect("session total missing")).expect("session total out of range");

    // Sign with an unrelated keypair that was never registered on file.
    let forged_key = Ed25519KeyPair::from_pkcs8(Ed25519KeyPair::generate_pkcs8(&ring::rand::SystemRandom::new()).unwrap().as_ref()).unwrap();
    let mandate = build_mandate(total, Currency::Usd, email, &forged_key);
    let update_request = UpdateSessionRequest { mandate: PaymentMandateWire::from(&mandate) };

    let update_response = client
        .put(format!("{merchant_base}/ucp/v1/checkout-sessions/{session_id}"))
        .json(&update_request)
        .send()
        .await
        .expect("update session request failed");
    assert_eq!(update_response.status(), reqwest::StatusCode::OK, "total/email match the session, so Update must succeed");

    let complete_response = client
        .post(format!("{merchant_base}/ucp/v1/checkout-sessions/{session_id}/complete"))
        .send()
        .await
        .expect("complete request failed");
    assert_eq!(complete_response.status(), reqwest::StatusCode::OK);
    let completed: serde_json::Value = complete_response.json().await.expect("complete response was not valid JSON");
    assert_eq!(completed["session"]["status"], json!("failed"));
    assert_eq!(
        completed["payment_status"]["error_message"],
        json!("INVALID_AUTHORIZATION: payment could not be completed")
    );
}

#[tokio::test]
async fn mandate_session_mismatch_is_rejected_at_update() {
    let (merchant_base, _shopper_base) = spawn_services(false, 0.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    let email = "mismatch@example.com";
    let key_pair = Ed25519KeyPair::from_pkcs8(Ed25519KeyPair::generate_pkcs8(&ring::rand::SystemRandom::new()).unwrap().as_ref()).unwrap();
    client
        .post(format!("{merchant_base}/ucp/v1/device-credentials"))
        .json(&json!({ "email": email, "public_key": common_utils::b64::encode(key_pair.public_key().as_ref()) }))
        .send()
        .await
        .expect("device-credential registration failed");

    let session = create_merchant_session(&client, &merchant_base, email).await;
    let session_id = session["id"].as_str().expect("session id missing").to_string();

    // Mismatched total: the session total is 19.98, the mandate claims 1.00.
    let mandate = build_mandate(Decimal::new(100, 2), Currency::Usd, email, &key_pair);
    let update_request = UpdateSessionRequest { mandate: PaymentMandateWire::from(&mandate) };

    let update_response = client
        .put(format!("{merchant_base}/ucp/v1/checkout-sessions/{session_id}"))
        .json(&update_request)
        .send()
        .await
        .expect("update session request failed");
    assert_eq!(update_response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = update_response.json().await.expect("error response was not valid JSON");
    assert_eq!(body["error_kind"], json!("MANDATE_SESSION_MISMATCH"));
}

#[tokio::test]
async fn concurrent_complete_replay_is_idempotent() {
    let (merchant_base, shopper_base) = spawn_services(false, 0.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    enroll(&client, &shopper_base, "replay@example.com").await;
    let prepared: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/prepare"))
        .json(&json!({
            "email": "replay@example.com",
            "line_items": [{ "sku": "PROD-001", "name": "Widget", "unit_price": 9.99, "quantity": 2 }],
            "currency": "USD",
        }))
        .send()
        .await
        .expect("prepare request failed")
        .json()
        .await
        .expect("prepare response was not valid JSON");
    let session_id = prepared["session_id"].as_str().expect("session_id missing").to_string();

    let first: serde_json::Value = client
        .post(format!("{shopper_base}/shopper/v1/purchase/confirm"))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .expect("first confirm request failed")
        .json()
        .await
        .expect("first confirm response was not valid JSON");
    assert_eq!(first["status"], json!("success"));
    let first_reference = first["receipt"]["network_reference"].as_str().expect("first receipt missing a reference").to_string();

    // A second confirm on an already-complete session replays the cached
    // outcome via the merchant's Complete idempotency path, not a fresh
    // Update, since the shopper's in-flight entry was already consumed.
    let second_response = client
        .post(format!("{merchant_base}/ucp/v1/checkout-sessions/{session_id}/complete"))
        .send()
        .await
        .expect("second complete request failed");
    assert_eq!(second_response.status(), reqwest::StatusCode::OK);
    let second: serde_json::Value = second_response.json().await.expect("second complete response was not valid JSON");
    assert_eq!(second["session"]["status"], json!("complete"));
    assert_eq!(
        second["session"]["receipt"]["network_reference"],
        json!(first_reference),
        "replaying Complete on a terminal session must return the same receipt, not mint a new one"
    );
}

#[tokio::test]
async fn enrollment_without_tokenization_is_not_marked_tokenized() {
    let (_merchant_base, shopper_base) = spawn_services(false, 0.0, Decimal::new(999_999, 2)).await;
    let client = reqwest::Client::new();

    let enrollment = enroll(&client, &shopper_base, "local-token@example.com").await;
    assert_eq!(enrollment["is_tokenized"], json!(false));
    assert_eq!(enrollment["last_four"], json!("4242"));
}
