//! The merchant's directory of shopper device public keys.
//!
//! The Credentials Provider (spec §4.4) and the device credentials it
//! mints live entirely on the Shopper side, but the AP2 Merchant Agent's
//! signature-validation step (spec §4.2 step 1) needs the public half of
//! that key "on file" to verify an incoming `user_authorization`. This
//! narrow registry is the merchant-side counterpart: the Shopper's
//! Credentials Provider publishes a device's public key here once, at
//! enrollment, the same way a real two-party deployment would register a
//! customer's payment method with a merchant on first use.

use async_trait::async_trait;
use common_utils::pii::Email;
use domain_types::errors::DomainResult;

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Registers (or replaces) the Ed25519 public key used to verify
    /// mandate authorizations for `email`.
    async fn register(&self, email: &Email, public_key: [u8; 32]) -> DomainResult<()>;

    /// The public key on file for `email`, or `NOT_FOUND` if none has
    /// been registered.
    async fn public_key_for(&self, email: &Email) -> DomainResult<[u8; 32]>;
}
