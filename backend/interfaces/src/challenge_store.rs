//! Persistence for `StepUpChallenge`s (spec §3, §4.2 step 3-4), split out
//! from `SessionStore` the same way the session itself only ever carries
//! the challenge's opaque id (`CheckoutSession.active_challenge`) rather
//! than the challenge's mutable state.

use async_trait::async_trait;
use domain_types::{challenge::StepUpChallenge, errors::DomainResult, ids::ChallengeId};

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn create(&self, challenge: StepUpChallenge) -> DomainResult<()>;

    async fn get(&self, id: &ChallengeId) -> DomainResult<StepUpChallenge>;

    async fn save(&self, challenge: StepUpChallenge) -> DomainResult<()>;
}
