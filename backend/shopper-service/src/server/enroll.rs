//! Credentials Provider HTTP surface: enrollment (spec §4.4).

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use common_enums::CardNetwork;
use common_utils::pii::Email;
use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::{error::ApiErrorResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub email: Email,
    pub display_name: String,
    pub pan: Secret<String>,
    pub expiry: String,
    pub network: CardNetwork,
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub instrument_id: String,
    pub credential_id: String,
    pub last_four: String,
    pub is_tokenized: bool,
}

async fn enroll(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<EnrollResponse>, ApiErrorResponse> {
    let result = state
        .credentials
        .enroll(request.email, request.display_name, request.pan, request.expiry, request.network)
        .await?;
    Ok(Json(EnrollResponse {
        instrument_id: result.instrument_id.as_str().to_string(),
        credential_id: result.credential_id.as_str().to_string(),
        last_four: result.last_four,
        is_tokenized: result.is_tokenized,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/shopper/v1/enroll", post(enroll))
}
