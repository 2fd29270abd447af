//! Checkout Orchestrator HTTP surface: prepare/confirm/submit-otp (spec §4.3).
//!
//! `confirm` takes no signature from the caller — the device key never
//! leaves this process in the simulated-device setup, so signing happens
//! internally as part of the confirm step.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use common_enums::Currency;
use common_utils::pii::Email;
use domain_types::{api::LineItemRequest, api::ReceiptView, ids::SessionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiErrorResponse,
    orchestrator::PurchaseOutcome,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
    pub email: Email,
    pub line_items: Vec<LineItemRequest>,
    pub currency: Currency,
}

#[derive(Debug, Serialize)]
pub struct PrepareResponse {
    pub session_id: String,
    pub currency: Currency,
    pub total: Decimal,
    pub card_last_four: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionIdRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOtpRequest {
    pub session_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurchaseResponse {
    Success { receipt: ReceiptView },
    OtpRequired,
    InvalidOtp,
    Failed { message: String },
}

impl From<PurchaseOutcome> for PurchaseResponse {
    fn from(outcome: PurchaseOutcome) -> Self {
        match outcome {
            PurchaseOutcome::Success(receipt) => Self::Success { receipt },
            PurchaseOutcome::OtpRequired => Self::OtpRequired,
            PurchaseOutcome::InvalidOtp => Self::InvalidOtp,
            PurchaseOutcome::Failed(message) => Self::Failed { message },
        }
    }
}

async fn prepare(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, ApiErrorResponse> {
    let result = state
        .orchestrator
        .prepare(request.email, request.line_items, request.currency)
        .await?;
    Ok(Json(PrepareResponse {
        session_id: result.session_id.as_str().to_string(),
        currency: result.total.currency,
        total: result.total.value,
        card_last_four: result.card_last_four,
    }))
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SessionIdRequest>,
) -> Result<Json<PurchaseResponse>, ApiErrorResponse> {
    let session_id = SessionId::from_raw(request.session_id);
    let outcome = state.orchestrator.confirm(&session_id).await?;
    Ok(Json(PurchaseResponse::from(outcome)))
}

async fn submit_otp(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitOtpRequest>,
) -> Result<Json<PurchaseResponse>, ApiErrorResponse> {
    let session_id = SessionId::from_raw(request.session_id);
    let outcome = state.orchestrator.submit_otp(&session_id, request.code).await?;
    Ok(Json(PurchaseResponse::from(outcome)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shopper/v1/purchase/prepare", post(prepare))
        .route("/shopper/v1/purchase/confirm", post(confirm))
        .route("/shopper/v1/purchase/submit-otp", post(submit_otp))
}
