//! Single-node in-memory `SessionStore`. Per-session serialization is
//! provided by a `tokio::sync::Mutex` guarding each session; the store's
//! outer map only needs a read/write lock for insertion and lookup, never
//! held across an await that touches session state (spec §5, §9).

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use domain_types::{checkout_session::CheckoutSession, errors::ApiError, errors::DomainResult, ids::SessionId};
use interfaces::session_store::{SessionStore, VersionedSession};
use tokio::sync::{Mutex, RwLock};

struct Slot {
    session: Mutex<CheckoutSession>,
    version: std::sync::atomic::AtomicU64,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Slot>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &SessionId) -> DomainResult<Arc<Slot>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("no checkout session with id {id}")))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: CheckoutSession) -> DomainResult<VersionedSession> {
        let id = session.id.clone();
        let slot = Arc::new(Slot {
            session: Mutex::new(session.clone()),
            version: std::sync::atomic::AtomicU64::new(0),
        });
        self.sessions.write().await.insert(id, slot);
        Ok(VersionedSession { session, version: 0 })
    }

    async fn get(&self, id: &SessionId) -> DomainResult<VersionedSession> {
        let slot = self.slot(id).await?;
        let session = slot.session.lock().await.clone();
        let version = slot.version.load(std::sync::atomic::Ordering::SeqCst);
        Ok(VersionedSession { session, version })
    }

    async fn compare_and_set(
        &self,
        id: &SessionId,
        expected_version: u64,
        updated: CheckoutSession,
    ) -> DomainResult<VersionedSession> {
        let slot = self.slot(id).await?;
        let mut guard = slot.session.lock().await;
        let current_version = slot.version.load(std::sync::atomic::Ordering::SeqCst);
        if current_version != expected_version {
            return Err(ApiError::invalid_state(format!(
                "session {id} was modified concurrently (expected version {expected_version}, found {current_version})"
            )));
        }
        *guard = updated.clone();
        let new_version = current_version + 1;
        slot.version.store(new_version, std::sync::atomic::Ordering::SeqCst);
        Ok(VersionedSession {
            session: updated,
            version: new_version,
        })
    }

    async fn list_expired(&self, now: time::OffsetDateTime) -> DomainResult<Vec<SessionId>> {
        let sessions = self.sessions.read().await;
        let mut expired = Vec::new();
        for (id, slot) in sessions.iter() {
            let session = slot.session.lock().await;
            if session.is_terminal() {
                continue;
            }
            let elapsed = common_utils::date_time::elapsed_secs(session.updated_at, now);
            if elapsed >= common_utils::consts::SESSION_INACTIVITY_TIMEOUT_SECS as i64 {
                expired.push(id.clone());
            }
        }
        Ok(expired)
    }

    async fn find_session_by_mandate_id(&self, mandate_id: &str) -> DomainResult<Option<SessionId>> {
        let sessions = self.sessions.read().await;
        for (id, slot) in sessions.iter() {
            let session = slot.session.lock().await;
            if let Some(mandate) = session.mandate.as_ref() {
                if mandate.contents.payment_mandate_id.as_str() == mandate_id {
                    return Ok(Some(id.clone()));
                }
            }
        }
        Ok(None)
    }
}
