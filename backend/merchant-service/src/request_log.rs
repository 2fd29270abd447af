//! Request-Log Recorder (spec §4.6). An axum middleware captures
//! before/after-call metadata around every UCP/AP2 route; the response
//! body is not read back off the wire but written into a per-request
//! [`BodySlot`] by the handler itself: the handler writes its serialized
//! response into a per-request context slot before returning, rather than
//! the middleware trying to re-read the body off the wire. The request
//! body is buffered by the middleware itself (the wire-level bytes are
//! still available at that point) and re-streamed to the handler
//! unchanged. Mandate id and signature, when a handler has a mandate in
//! scope, are stashed in a [`MandateSlot`] the same way. Persisting the
//! entry is spawned onto a background task so a slow or failing recorder
//! never delays the response.

use std::{collections::VecDeque, sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use domain_types::{
    ids::MandateId,
    request_log::{RequestKind, RequestLogEntry},
};
use tokio::sync::{Mutex, RwLock};

use crate::consts;

/// Where a handler stashes its serialized response body for the recorder
/// to pick up after `next.run` returns. Cloned cheaply per request.
#[derive(Clone, Default)]
pub struct BodySlot(Arc<Mutex<Option<String>>>);

impl BodySlot {
    pub async fn set(&self, body: impl Into<String>) {
        *self.0.lock().await = Some(body.into());
    }
}

/// Where a handler stashes the mandate it validated or attached, so the
/// recorder can log it without re-parsing request/response bodies.
#[derive(Clone, Default)]
pub struct MandateSlot(Arc<Mutex<Option<(MandateId, String)>>>);

impl MandateSlot {
    pub async fn set(&self, mandate_id: MandateId, signature: impl Into<String>) {
        *self.0.lock().await = Some((mandate_id, signature.into()));
    }
}

#[derive(Default)]
pub struct RequestLogRecorder {
    entries: RwLock<VecDeque<RequestLogEntry>>,
    capacity: usize,
}

impl RequestLogRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn record(&self, entry: RequestLogEntry) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub async fn recent(&self, limit: usize) -> Vec<RequestLogEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }
}

fn classify(path: &str) -> RequestKind {
    if path.ends_with("/checkout-sessions") || path.contains("/checkout-sessions/") {
        RequestKind::Ap2
    } else {
        RequestKind::Ucp
    }
}

pub async fn record_request(
    State(recorder): State<Arc<RequestLogRecorder>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let request_id = request
        .headers()
        .get(consts::X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, consts::REQUEST_LOG_BODY_LIMIT).await.unwrap_or_default();
    let request_body = if body_bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body_bytes).into_owned())
    };
    let mut request = Request::from_parts(parts, Body::from(body_bytes));

    let body_slot = BodySlot::default();
    let mandate_slot = MandateSlot::default();
    request.extensions_mut().insert(body_slot.clone());
    request.extensions_mut().insert(mandate_slot.clone());

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    let kind = classify(&path);

    tokio::spawn(async move {
        let response_body = body_slot.0.lock().await.clone();
        let (mandate_id, signature) = match mandate_slot.0.lock().await.clone() {
            Some((mandate_id, signature)) => (Some(mandate_id), Some(signature)),
            None => (None, None),
        };
        let entry = RequestLogEntry {
            id: domain_types::ids::RequestLogId::generate(),
            kind,
            endpoint: path,
            method,
            status,
            request_body,
            response_body,
            signature,
            mandate_id,
            client_ip,
            duration_micros,
            recorded_at: common_utils::date_time::now(),
        };
        let _ = request_id;
        recorder.record(entry).await;
    });

    response
}
