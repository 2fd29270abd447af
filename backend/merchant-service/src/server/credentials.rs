//! Narrow endpoint the Shopper's Credentials Provider calls at enrollment
//! to publish a device's public key, so the AP2 Merchant Agent has
//! something "on file" to verify a mandate's `user_authorization` against
//! (spec §4.2 step 1, §4.4).

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use common_utils::pii::Email;
use serde::Deserialize;

use crate::{error::ApiErrorResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceKeyRequest {
    pub email: Email,
    /// URL-safe base64, unpadded (spec §6 "Base64 discipline").
    pub public_key: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterDeviceKeyRequest>,
) -> Result<(), ApiErrorResponse> {
    let decoded = common_utils::b64::decode(&request.public_key)
        .map_err(|err| domain_types::errors::ApiError::invalid_input(format!("malformed public_key: {err}")))?;
    let public_key: [u8; 32] = decoded
        .try_into()
        .map_err(|_| domain_types::errors::ApiError::invalid_input("public_key must be 32 bytes"))?;
    state.devices.register(&request.email, public_key).await?;
    Ok(())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ucp/v1/device-credentials", post(register))
}
