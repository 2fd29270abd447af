//! Checkout Session Manager HTTP surface (spec §4.1): Create, Get,
//! Update, Complete at `/ucp/v1/checkout-sessions`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use domain_types::{
    api::{
        CompleteSessionQuery, CompleteSessionResponse, CreateSessionRequest, OtpChallengeEnvelope, PaymentMethodDetailsOut,
        PaymentStatus, SessionView, UpdateSessionRequest,
    },
    checkout_session::CheckoutSession,
    ids::{MandateId, SessionId},
};

use crate::{
    ap2_agent::CompleteOutcome,
    error::ApiErrorResponse,
    request_log::{BodySlot, MandateSlot},
    state::AppState,
};

/// Stashes the mandate id and signature a session carries, if any, for the
/// Request-Log Recorder (spec §3, §4.6).
async fn log_mandate(mandate_slot: &MandateSlot, session: &CheckoutSession) {
    if let Some(mandate) = &session.mandate {
        mandate_slot
            .set(
                MandateId::from_raw(mandate.contents.payment_mandate_id.as_str()),
                common_utils::b64::encode(&mandate.user_authorization),
            )
            .await;
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(body_slot): Extension<BodySlot>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, ApiErrorResponse> {
    let session = state.checkout.create(request).await?;
    let view = SessionView::from(&session);
    if let Ok(body) = serde_json::to_string(&view) {
        body_slot.set(body).await;
    }
    Ok(Json(view))
}

async fn get(
    State(state): State<Arc<AppState>>,
    Extension(body_slot): Extension<BodySlot>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiErrorResponse> {
    let session = state.checkout.get(&id).await?;
    let view = SessionView::from(&session);
    if let Ok(body) = serde_json::to_string(&view) {
        body_slot.set(body).await;
    }
    Ok(Json(view))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Extension(body_slot): Extension<BodySlot>,
    Extension(mandate_slot): Extension<MandateSlot>,
    Path(id): Path<SessionId>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Json<SessionView>, ApiErrorResponse> {
    let session = state.checkout.update(&id, request).await?;
    log_mandate(&mandate_slot, &session).await;
    let view = SessionView::from(&session);
    if let Ok(body) = serde_json::to_string(&view) {
        body_slot.set(body).await;
    }
    Ok(Json(view))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(body_slot): Extension<BodySlot>,
    Extension(mandate_slot): Extension<MandateSlot>,
    Path(id): Path<SessionId>,
    Query(query): Query<CompleteSessionQuery>,
) -> Result<Json<CompleteSessionResponse>, ApiErrorResponse> {
    let outcome = state.ap2_agent.complete(&id, query.otp_code).await?;

    let response = match outcome {
        CompleteOutcome::Success(session) => {
            log_mandate(&mandate_slot, &session).await;
            CompleteSessionResponse {
                session: SessionView::from(&session),
                payment_status: PaymentStatus { error_message: None },
                payment_method_details: PaymentMethodDetailsOut { otp_challenge: None },
            }
        }
        CompleteOutcome::StepUpRequired(session, challenge_id) => {
            log_mandate(&mandate_slot, &session).await;
            let mandate_id = session
                .mandate
                .as_ref()
                .map(|mandate| mandate.contents.payment_mandate_id.as_str().to_string())
                .unwrap_or_default();
            CompleteSessionResponse {
                session: SessionView::from(&session),
                payment_status: PaymentStatus {
                    error_message: Some("OTP_REQUIRED: a one-time code is required to complete this payment".to_string()),
                },
                payment_method_details: PaymentMethodDetailsOut {
                    otp_challenge: Some(OtpChallengeEnvelope {
                        payment_mandate_id: mandate_id,
                        message: format!("challenge {challenge_id} issued, retry with ?otp_code=<6 digits>"),
                    }),
                },
            }
        }
        CompleteOutcome::InvalidOtp(session) => {
            log_mandate(&mandate_slot, &session).await;
            CompleteSessionResponse {
                session: SessionView::from(&session),
                payment_status: PaymentStatus {
                    error_message: Some("INVALID_OTP: the supplied code did not match".to_string()),
                },
                payment_method_details: PaymentMethodDetailsOut { otp_challenge: None },
            }
        }
        CompleteOutcome::Failed(session, kind) => {
            log_mandate(&mandate_slot, &session).await;
            CompleteSessionResponse {
                session: SessionView::from(&session),
                payment_status: PaymentStatus {
                    error_message: Some(format!("{kind}: payment could not be completed")),
                },
                payment_method_details: PaymentMethodDetailsOut { otp_challenge: None },
            }
        }
    };

    if let Ok(body) = serde_json::to_string(&response) {
        body_slot.set(body).await;
    }
    Ok(Json(response))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ucp/v1/checkout-sessions", post(create))
        .route("/ucp/v1/checkout-sessions/{id}", get(get).put(update))
        .route("/ucp/v1/checkout-sessions/{id}/complete", post(complete))
}
