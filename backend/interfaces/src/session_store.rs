//! Pluggable checkout-session persistence (spec §9: in-memory storage
//! behind a narrow, swappable interface).
//!
//! The contract is deliberately narrow: get-by-id, create,
//! compare-and-set with version, list-expired. Any implementation that
//! preserves per-session serialization and this contract is conformant;
//! a single-node hash map guarded by per-session mutexes is the only
//! implementation shipped here.

use async_trait::async_trait;
use domain_types::{checkout_session::CheckoutSession, errors::DomainResult, ids::SessionId};

/// A session plus the version it was read at, used for optimistic
/// compare-and-set writers.
#[derive(Debug, Clone)]
pub struct VersionedSession {
    pub session: CheckoutSession,
    pub version: u64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: CheckoutSession) -> DomainResult<VersionedSession>;

    async fn get(&self, id: &SessionId) -> DomainResult<VersionedSession>;

    /// Replaces the stored session iff its current version equals
    /// `expected_version`; returns the new version on success.
    async fn compare_and_set(
        &self,
        id: &SessionId,
        expected_version: u64,
        updated: CheckoutSession,
    ) -> DomainResult<VersionedSession>;

    /// Sessions in `ready_for_complete` or `requires_escalation` whose
    /// inactivity deadline has passed (spec §5).
    async fn list_expired(&self, now: time::OffsetDateTime) -> DomainResult<Vec<SessionId>>;

    /// The session a mandate id is currently attached to, if any — backs
    /// the per-mandate uniqueness rule (spec §5: "a mandate id may be
    /// attached to at most one session").
    async fn find_session_by_mandate_id(&self, mandate_id: &str) -> DomainResult<Option<SessionId>>;
}
