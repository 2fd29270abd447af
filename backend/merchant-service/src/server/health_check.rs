use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "serving" })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
