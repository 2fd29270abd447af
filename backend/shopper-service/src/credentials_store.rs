//! Single-node in-memory `CredentialsStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use common_utils::pii::Email;
use domain_types::{
    errors::{ApiError, DomainResult},
    ids::{DeviceCredentialId, InstrumentId},
    user::{DeviceCredential, PaymentInstrument, User},
};
use interfaces::credentials_store::CredentialsStore;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryCredentialsStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialsStore for InMemoryCredentialsStore {
    async fn create_user(&self, user: User) -> DomainResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(user.email.as_str()) {
            return Err(ApiError::invalid_state(format!("user {} already enrolled", user.email.as_str())));
        }
        users.insert(user.email.as_str().to_string(), user);
        Ok(())
    }

    async fn get_user(&self, email: &Email) -> DomainResult<User> {
        self.users
            .read()
            .await
            .get(email.as_str())
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))
    }

    async fn add_device_credential(&self, email: &Email, credential: DeviceCredential) -> DomainResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(email.as_str())
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))?;
        user.device_credentials.push(credential);
        Ok(())
    }

    async fn add_payment_instrument(&self, email: &Email, instrument: PaymentInstrument) -> DomainResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(email.as_str())
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))?;
        user.payment_instruments.push(instrument);
        Ok(())
    }

    async fn update_instrument(&self, email: &Email, instrument: PaymentInstrument) -> DomainResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(email.as_str())
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))?;
        let slot = user
            .payment_instruments
            .iter_mut()
            .find(|existing| existing.id == instrument.id)
            .ok_or_else(|| ApiError::not_found(format!("instrument {} not found", instrument.id.as_str())))?;
        *slot = instrument;
        Ok(())
    }

    async fn find_credential(&self, email: &Email, credential_id: &DeviceCredentialId) -> DomainResult<DeviceCredential> {
        let users = self.users.read().await;
        let user = users
            .get(email.as_str())
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))?;
        user.credential(credential_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("device credential {credential_id} not found")))
    }

    async fn find_instrument(&self, email: &Email, instrument_id: &InstrumentId) -> DomainResult<PaymentInstrument> {
        let users = self.users.read().await;
        let user = users
            .get(email.as_str())
            .ok_or_else(|| ApiError::not_found(format!("no user enrolled for {}", email.as_str())))?;
        user.payment_instruments
            .iter()
            .find(|existing| &existing.id == instrument_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("instrument {instrument_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_enums::CardNetwork;
    use common_utils::pii::EncryptedPanStrategy;
    use masking::Secret;

    fn email() -> Email {
        Email::try_from("shopper@example.com".to_string()).unwrap()
    }

    fn instrument() -> PaymentInstrument {
        PaymentInstrument {
            id: InstrumentId::generate(),
            encrypted_pan: Secret::<Vec<u8>, EncryptedPanStrategy>::new(vec![1, 2, 3]),
            last_four: "4242".into(),
            network: CardNetwork::Visa,
            expiry: "12/30".into(),
            tokenization: None,
        }
    }

    #[tokio::test]
    async fn duplicate_enrollment_is_rejected() {
        let store = InMemoryCredentialsStore::new();
        let now = common_utils::date_time::now();
        store.create_user(User::new(email(), "Ada", now)).await.unwrap();
        let err = store.create_user(User::new(email(), "Ada", now)).await.unwrap_err();
        assert_eq!(err.kind, common_enums::ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn instrument_lookup_round_trips() {
        let store = InMemoryCredentialsStore::new();
        let now = common_utils::date_time::now();
        store.create_user(User::new(email(), "Ada", now)).await.unwrap();
        let instrument = instrument();
        store.add_payment_instrument(&email(), instrument.clone()).await.unwrap();
        let found = store.find_instrument(&email(), &instrument.id).await.unwrap();
        assert_eq!(found.last_four, "4242");
    }
}
