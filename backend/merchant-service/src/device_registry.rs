//! Single-node in-memory `DeviceRegistry`.

use std::collections::HashMap;

use async_trait::async_trait;
use common_utils::pii::Email;
use domain_types::errors::{ApiError, DomainResult};
use interfaces::device_registry::DeviceRegistry;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDeviceRegistry {
    keys: RwLock<HashMap<String, [u8; 32]>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn register(&self, email: &Email, public_key: [u8; 32]) -> DomainResult<()> {
        self.keys.write().await.insert(email.as_str().to_string(), public_key);
        Ok(())
    }

    async fn public_key_for(&self, email: &Email) -> DomainResult<[u8; 32]> {
        self.keys
            .read()
            .await
            .get(email.as_str())
            .copied()
            .ok_or_else(|| ApiError::not_found(format!("no device credential on file for {}", email.as_str())))
    }
}
