//! Discovery Publisher (spec §4, §6): `GET /.well-known/ucp`.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use domain_types::discovery::{DiscoveryDocument, MerchantInfo};

use crate::state::AppState;

const UCP_VERSION: &str = "2025-01-01";

async fn discovery(State(state): State<Arc<AppState>>) -> Json<DiscoveryDocument> {
    let merchant = &state.config.merchant;
    let rest_endpoint = format!("{}/ucp/v1", merchant.public_base_url.trim_end_matches('/'));
    let document = DiscoveryDocument::new(
        UCP_VERSION,
        rest_endpoint,
        MerchantInfo {
            id: merchant.id.clone(),
            name: merchant.name.clone(),
            url: merchant.url.clone(),
        },
    );
    Json(document)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/.well-known/ucp", get(discovery))
}
