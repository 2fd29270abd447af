//! `GET /ucp/products/search` (spec §6).

use std::sync::Arc;

use axum::{extract::{Query, State}, routing::get, Json, Router};
use domain_types::api::{ProductSearchQuery, ProductSearchResponse};

use crate::{error::ApiErrorResponse, state::AppState};

const DEFAULT_LIMIT: u32 = 20;

async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductSearchQuery>,
) -> Result<Json<ProductSearchResponse>, ApiErrorResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100);
    let (items, total) = state.catalog.search(query.q.as_deref(), limit).await?;
    Ok(Json(ProductSearchResponse { items, total }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ucp/products/search", get(search))
}
