//! Exercises `CheckoutOrchestrator` against a mocked merchant: no real
//! merchant-service process, just wiremock stubs for discovery and the
//! checkout-session HTTP surface. This isolates the shopper's own
//! idempotency/step-up handling from the merchant's actual state machine
//! (which `e2e-tests` already drives end to end with a real merchant).

use std::sync::Arc;

use common_enums::{CardNetwork, Currency};
use common_utils::pii::Email;
use masking::Secret;
use serde_json::json;
use shopper_service::{
    ap2_consumer::Ap2ConsumerAgent, credentials::CredentialsProvider, credentials_store::InMemoryCredentialsStore,
    merchant_client::MerchantClient, orchestrator::{CheckoutOrchestrator, PurchaseOutcome}, pan_cipher::PanCipher,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn discovery_document(rest_endpoint: &str) -> serde_json::Value {
    json!({
        "ucp": {
            "version": "2025-01-01",
            "services": {
                "dev.ucp.shopping": { "rest": { "endpoint": rest_endpoint } }
            }
        },
        "capabilities": ["dev.ucp.shopping.product_search", "dev.ucp.shopping.checkout"],
        "payment": { "ap2_payment": { "mandates_supported": true, "otp_verification_supported": true } },
        "merchant": { "id": "merchant_mock", "name": "Mocked Merchant", "url": "https://merchant.mock.example" }
    })
}

fn session_view(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "line_items": [{ "sku": "SKU-1", "name": "Gadget", "unit_price": 19.99, "quantity": 1 }],
        "buyer_email": "orchestrator@example.com",
        "currency": "USD",
        "subtotal": 19.99,
        "tax": 0.0,
        "total": 19.99,
        "status": status,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

async fn build_orchestrator(mock_server: &MockServer) -> CheckoutOrchestrator {
    Mock::given(method("GET"))
        .and(path("/.well-known/ucp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&format!("{}/ucp/v1", mock_server.uri()))))
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ucp/v1/device-credentials"))
        .respond_with(ResponseTemplate::new(200))
        .mount(mock_server)
        .await;

    let cipher = PanCipher::from_base64(&Secret::new(common_utils::b64::encode([9u8; 32]))).expect("cipher key must be valid");
    let merchant = Arc::new(MerchantClient::new(format!("{}/.well-known/ucp", mock_server.uri()), 5));
    let credentials = Arc::new(CredentialsProvider::new(
        Arc::new(InMemoryCredentialsStore::new()),
        cipher,
        Arc::new(external_services::tokenization::NoopAdapter),
        Arc::clone(&merchant),
    ));
    credentials
        .enroll(
            Email::try_from("orchestrator@example.com".to_string()).expect("valid test email"),
            "Orchestrator Shopper".to_string(),
            Secret::new("4242424242424242".to_string()),
            "12/30".to_string(),
            CardNetwork::Visa,
        )
        .await
        .expect("enrollment must succeed");

    let consumer_agent = Ap2ConsumerAgent::new("https://shopper-orchestrator.example");
    CheckoutOrchestrator::new(credentials, consumer_agent, merchant, Arc::new(external_services::tokenization::NoopAdapter))
}

#[tokio::test]
async fn prepare_then_confirm_completes_successfully() {
    let mock_server = MockServer::start().await;
    let orchestrator = build_orchestrator(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/ucp/v1/checkout-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_view("sess_mock1", "incomplete")))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/ucp/v1/checkout-sessions/sess_mock1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_view("sess_mock1", "ready_for_complete")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ucp/v1/checkout-sessions/sess_mock1/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": {
                "id": "sess_mock1",
                "line_items": [{ "sku": "SKU-1", "name": "Gadget", "unit_price": 19.99, "quantity": 1 }],
                "buyer_email": "orchestrator@example.com",
                "currency": "USD",
                "subtotal": 19.99,
                "tax": 0.0,
                "total": 19.99,
                "status": "complete",
                "receipt": {
                    "settlement_status": "Captured",
                    "amount": 19.99,
                    "currency": "USD",
                    "network_reference": "conf_mock_1",
                    "issued_at": "2026-01-01T00:00:00Z"
                },
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            },
            "payment_status": { "error_message": null },
            "payment_method_details": {}
        })))
        .mount(&mock_server)
        .await;

    let prepared = orchestrator
        .prepare(
            Email::try_from("orchestrator@example.com".to_string()).expect("valid test email"),
            vec![domain_types::api::LineItemRequest {
                sku: "SKU-1".to_string(),
                name: "Gadget".to_string(),
                unit_price: rust_decimal::Decimal::new(1999, 2),
                quantity: 1,
            }],
            Currency::Usd,
        )
        .await
        .expect("prepare should succeed");
    assert_eq!(prepared.card_last_four, "4242");

    let outcome = orchestrator.confirm(&prepared.session_id).await.expect("confirm should succeed");
    match outcome {
        PurchaseOutcome::Success(receipt) => assert_eq!(receipt.network_reference, "conf_mock_1"),
        other => panic!("expected a success outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn confirm_surfaces_a_step_up_challenge_then_resolves_with_submit_otp() {
    let mock_server = MockServer::start().await;
    let orchestrator = build_orchestrator(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/ucp/v1/checkout-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_view("sess_mock2", "incomplete")))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/ucp/v1/checkout-sessions/sess_mock2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_view("sess_mock2", "ready_for_complete")))
        .mount(&mock_server)
        .await;

    let escalated = json!({
        "session": {
            "id": "sess_mock2",
            "line_items": [{ "sku": "SKU-1", "name": "Gadget", "unit_price": 19.99, "quantity": 1 }],
            "buyer_email": "orchestrator@example.com",
            "currency": "USD",
            "subtotal": 19.99,
            "tax": 0.0,
            "total": 19.99,
            "status": "requires_escalation",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        },
        "payment_status": { "error_message": "OTP_REQUIRED: a one-time code is required to complete this payment" },
        "payment_method_details": { "otp_challenge": { "payment_mandate_id": "mandate_mock", "message": "enter the code" } }
    });
    // The plain "no otp_code" case falls through to this catch-all at the
    // default priority; the exact-match mock below is given a higher
    // priority so it wins for the submit_otp call despite also satisfying
    // this mock's (absent) query constraint.
    Mock::given(method("POST"))
        .and(path("/ucp/v1/checkout-sessions/sess_mock2/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&escalated))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ucp/v1/checkout-sessions/sess_mock2/complete"))
        .and(wiremock::matchers::query_param("otp_code", "246810"))
        .with_priority(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": {
                "id": "sess_mock2",
                "line_items": [{ "sku": "SKU-1", "name": "Gadget", "unit_price": 19.99, "quantity": 1 }],
                "buyer_email": "orchestrator@example.com",
                "currency": "USD",
                "subtotal": 19.99,
                "tax": 0.0,
                "total": 19.99,
                "status": "complete",
                "receipt": {
                    "settlement_status": "Captured",
                    "amount": 19.99,
                    "currency": "USD",
                    "network_reference": "conf_mock_2",
                    "issued_at": "2026-01-01T00:00:00Z"
                },
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            },
            "payment_status": { "error_message": null },
            "payment_method_details": {}
        })))
        .mount(&mock_server)
        .await;

    let prepared = orchestrator
        .prepare(
            Email::try_from("orchestrator@example.com".to_string()).expect("valid test email"),
            vec![domain_types::api::LineItemRequest {
                sku: "SKU-1".to_string(),
                name: "Gadget".to_string(),
                unit_price: rust_decimal::Decimal::new(1999, 2),
                quantity: 1,
            }],
            Currency::Usd,
        )
        .await
        .expect("prepare should succeed");

    let first = orchestrator.confirm(&prepared.session_id).await.expect("confirm should succeed");
    assert!(matches!(first, PurchaseOutcome::OtpRequired), "expected a step-up challenge, got {first:?}");

    let second = orchestrator
        .submit_otp(&prepared.session_id, "246810".to_string())
        .await
        .expect("submit_otp should succeed");
    match second {
        PurchaseOutcome::Success(receipt) => assert_eq!(receipt.network_reference, "conf_mock_2"),
        other => panic!("expected the OTP to resolve the purchase, got {other:?}"),
    }
}
