//! `RequestLogEntry` — append-only record captured by the Merchant's
//! Request-Log Recorder for every inbound UCP/AP2 request (spec §3, §4.6).

use time::OffsetDateTime;

use crate::ids::{MandateId, RequestLogId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RequestKind {
    Ucp,
    Ap2,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RequestLogEntry {
    pub id: RequestLogId,
    pub kind: RequestKind,
    pub endpoint: String,
    pub method: String,
    pub status: u16,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub signature: Option<String>,
    pub mandate_id: Option<MandateId>,
    pub client_ip: Option<String>,
    pub duration_micros: u64,
    pub recorded_at: OffsetDateTime,
}
