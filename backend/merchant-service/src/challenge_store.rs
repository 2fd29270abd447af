//! Single-node in-memory `ChallengeStore`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use domain_types::{
    challenge::StepUpChallenge,
    errors::{ApiError, DomainResult},
    ids::ChallengeId,
};
use interfaces::challenge_store::ChallengeStore;
use tokio::sync::{Mutex, RwLock};

#[derive(Default)]
pub struct InMemoryChallengeStore {
    challenges: RwLock<HashMap<ChallengeId, Arc<Mutex<StepUpChallenge>>>>,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn create(&self, challenge: StepUpChallenge) -> DomainResult<()> {
        self.challenges
            .write()
            .await
            .insert(challenge.id.clone(), Arc::new(Mutex::new(challenge)));
        Ok(())
    }

    async fn get(&self, id: &ChallengeId) -> DomainResult<StepUpChallenge> {
        let challenges = self.challenges.read().await;
        let slot = challenges
            .get(id)
            .ok_or_else(|| ApiError::not_found(format!("no step-up challenge with id {id}")))?;
        Ok(slot.lock().await.clone())
    }

    async fn save(&self, challenge: StepUpChallenge) -> DomainResult<()> {
        let challenges = self.challenges.read().await;
        let slot = challenges
            .get(&challenge.id)
            .ok_or_else(|| ApiError::not_found(format!("no step-up challenge with id {}", challenge.id)))?;
        *slot.lock().await = challenge;
        Ok(())
    }
}
