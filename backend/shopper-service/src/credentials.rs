//! Credentials Provider (spec §4.4): enrollment, device challenge/response,
//! and custody of the device's private signing key.
//!
//! There is no real external device/browser in this two-service
//! demonstrator, so the simulated device's Ed25519 private key material is
//! held here, in a side table keyed by [`DeviceCredentialId`] — separate
//! from [`DeviceCredential`], which (per the stored domain model) only ever
//! carries the public half. Signing happens synchronously inside the
//! orchestrator's confirm step rather than requiring a round trip to an
//! external client.

use std::{collections::HashMap, sync::Arc};

use common_enums::CardNetwork;
use common_utils::pii::{Email, EncryptedPanStrategy};
use domain_types::{
    errors::{ApiError, DomainResult},
    ids::{DeviceCredentialId, InstrumentId},
    user::{DeviceCredential, PaymentInstrument, TokenizationState, User},
};
use interfaces::{
    credentials_store::CredentialsStore,
    tokenization::{TokenizationAdapter, TokenizeRequest},
};
use masking::Secret;
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519},
};
use tokio::sync::RwLock;

use crate::{merchant_client::MerchantClient, pan_cipher::PanCipher};

pub struct EnrollmentResult {
    pub instrument_id: InstrumentId,
    pub credential_id: DeviceCredentialId,
    pub last_four: String,
    pub is_tokenized: bool,
}

pub struct CredentialsProvider {
    store: Arc<dyn CredentialsStore>,
    device_keys: RwLock<HashMap<String, Vec<u8>>>,
    pan_cipher: PanCipher,
    tokenization: Arc<dyn TokenizationAdapter>,
    merchant: Arc<MerchantClient>,
    rng: SystemRandom,
}

impl CredentialsProvider {
    pub fn new(
        store: Arc<dyn CredentialsStore>,
        pan_cipher: PanCipher,
        tokenization: Arc<dyn TokenizationAdapter>,
        merchant: Arc<MerchantClient>,
    ) -> Self {
        Self {
            store,
            device_keys: RwLock::new(HashMap::new()),
            pan_cipher,
            tokenization,
            merchant,
            rng: SystemRandom::new(),
        }
    }

    /// Creates a User, registers a device credential by challenge-response,
    /// creates a default payment instrument with the PAN encrypted at rest,
    /// and optionally enrolls the card with the network tokenization
    /// adapter (spec §4.4, §4.5).
    pub async fn enroll(
        &self,
        email: Email,
        display_name: String,
        pan: Secret<String>,
        expiry: String,
        network: CardNetwork,
    ) -> DomainResult<EnrollmentResult> {
        let now = common_utils::date_time::now();

        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&self.rng)
            .map_err(|_| ApiError::internal("failed to generate device key"))?;
        let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
            .map_err(|_| ApiError::internal("failed to reconstitute freshly generated device key"))?;
        let public_key: [u8; 32] = key_pair
            .public_key()
            .as_ref()
            .try_into()
            .map_err(|_| ApiError::internal("generated an unexpected Ed25519 public key length"))?;

        // Challenge-response enrollment: S issues a challenge, the device
        // (simulated here) asserts over it with the freshly generated key,
        // and S verifies the assertion before trusting the credential.
        let mut challenge = [0u8; 32];
        ring::rand::SecureRandom::fill(&self.rng, &mut challenge)
            .map_err(|_| ApiError::internal("failed to generate enrollment challenge"))?;
        let assertion = key_pair.sign(&challenge);
        UnparsedPublicKey::new(&ED25519, &public_key)
            .verify(&challenge, assertion.as_ref())
            .map_err(|_| ApiError::internal("device failed to attest its freshly generated key"))?;

        let credential = DeviceCredential::new(public_key, now);
        let credential_id = credential.id.clone();

        let last_four = last_four_of(pan.clone());
        let encrypted_pan: Secret<Vec<u8>, EncryptedPanStrategy> = Secret::new(self.pan_cipher.encrypt(&pan)?);
        let instrument_id = InstrumentId::generate();
        let mut instrument = PaymentInstrument {
            id: instrument_id.clone(),
            encrypted_pan,
            last_four: last_four.clone(),
            network,
            expiry: expiry.clone(),
            tokenization: None,
        };

        let user = User::new(email.clone(), display_name, now);
        self.store.create_user(user).await?;
        self.store.add_device_credential(&email, credential).await?;
        self.store.add_payment_instrument(&email, instrument.clone()).await?;

        self.device_keys.write().await.insert(credential_id.as_str().to_string(), pkcs8.as_ref().to_vec());

        let mut is_tokenized = false;
        if self.tokenization.is_enabled() {
            match self
                .tokenization
                .tokenize(TokenizeRequest {
                    pan: pan.clone(),
                    expiry,
                    network,
                })
                .await
            {
                Ok(Some(result)) => {
                    instrument.tokenization = Some(TokenizationState {
                        network_token: result.network_token,
                        token_reference: result.token_reference,
                        assurance_level: result.assurance_level,
                        tokenized_at: now,
                    });
                    self.store.update_instrument(&email, instrument).await?;
                    is_tokenized = true;
                }
                Ok(None) => {}
                Err(error) => {
                    // Network adapter failures are never fatal to enrollment
                    // (spec §4.5): the user still registers, and later
                    // mandates fall back to locally generated tokens.
                    tracing::warn!(?error, "tokenization enrollment failed, continuing unenrolled");
                }
            }
        }

        self.merchant.register_device_credential(&email, public_key).await?;

        Ok(EnrollmentResult {
            instrument_id,
            credential_id,
            last_four,
            is_tokenized,
        })
    }

    pub async fn user(&self, email: &Email) -> DomainResult<User> {
        self.store.get_user(email).await
    }

    /// Signs `bytes` with the device key registered under `credential_id`.
    pub async fn sign_with_device(&self, credential_id: &DeviceCredentialId, bytes: &[u8]) -> DomainResult<Vec<u8>> {
        let pkcs8 = self
            .device_keys
            .read()
            .await
            .get(credential_id.as_str())
            .cloned()
            .ok_or_else(|| ApiError::internal(format!("no private key on file for device credential {credential_id}")))?;
        let key_pair = Ed25519KeyPair::from_pkcs8(&pkcs8)
            .map_err(|_| ApiError::internal("stored device key could not be reconstituted"))?;
        Ok(key_pair.sign(bytes).as_ref().to_vec())
    }
}

fn last_four_of(pan: Secret<String>) -> String {
    use masking::ExposeInterface;
    let digits = pan.expose();
    let len = digits.len();
    if len >= 4 {
        digits[len - 4..].to_string()
    } else {
        digits
    }
}
