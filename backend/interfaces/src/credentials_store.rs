//! Shopper-side persistence for users, device credentials, and payment
//! instruments (spec §3, §4.4).

use async_trait::async_trait;
use common_utils::pii::Email;
use domain_types::{
    errors::DomainResult,
    ids::{DeviceCredentialId, InstrumentId},
    user::{DeviceCredential, PaymentInstrument, User},
};

#[async_trait]
pub trait CredentialsStore: Send + Sync {
    async fn create_user(&self, user: User) -> DomainResult<()>;

    async fn get_user(&self, email: &Email) -> DomainResult<User>;

    async fn add_device_credential(&self, email: &Email, credential: DeviceCredential) -> DomainResult<()>;

    async fn add_payment_instrument(&self, email: &Email, instrument: PaymentInstrument) -> DomainResult<()>;

    /// Persists the tokenization fields set on an instrument after a
    /// successful Network Tokenization Adapter enrollment (spec §4.5).
    async fn update_instrument(&self, email: &Email, instrument: PaymentInstrument) -> DomainResult<()>;

    async fn find_credential(
        &self,
        email: &Email,
        credential_id: &DeviceCredentialId,
    ) -> DomainResult<DeviceCredential>;

    async fn find_instrument(&self, email: &Email, instrument_id: &InstrumentId) -> DomainResult<PaymentInstrument>;
}
