//! `User`, `DeviceCredential`, `PaymentInstrument` — owned by the Shopper's
//! Credentials Provider (spec §3, §4.4).

use common_enums::CardNetwork;
use common_utils::pii::{Email, EncryptedPanStrategy};
use masking::Secret;
use time::OffsetDateTime;

use crate::ids::{DeviceCredentialId, InstrumentId};

/// A registered user of the Shopper service. Identity is the case-folded
/// email; never deleted by the protocol, only ever gains/loses credentials
/// and instruments.
#[derive(Debug, Clone)]
pub struct User {
    pub email: Email,
    pub display_name: String,
    pub device_credentials: Vec<DeviceCredential>,
    pub payment_instruments: Vec<PaymentInstrument>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(email: Email, display_name: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            email,
            display_name: display_name.into(),
            device_credentials: Vec::new(),
            payment_instruments: Vec::new(),
            created_at,
        }
    }

    pub fn default_instrument(&self) -> Option<&PaymentInstrument> {
        self.payment_instruments.first()
    }

    pub fn credential(&self, id: &DeviceCredentialId) -> Option<&DeviceCredential> {
        self.device_credentials.iter().find(|c| &c.id == id)
    }
}

/// A device-bound asymmetric key registered during enrollment (spec §3).
/// The public key is Ed25519 — a demonstrator stand-in for the WebAuthn
/// COSE key a production device credential would carry (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct DeviceCredential {
    pub id: DeviceCredentialId,
    pub public_key: [u8; 32],
    pub counter: u64,
    pub created_at: OffsetDateTime,
}

impl DeviceCredential {
    pub fn new(public_key: [u8; 32], created_at: OffsetDateTime) -> Self {
        Self {
            id: DeviceCredentialId::generate(),
            public_key,
            counter: 0,
            created_at,
        }
    }
}

/// A card-on-file held by the Shopper (spec §3). The raw PAN never crosses
/// the S→M boundary; `encrypted_pan` is the only place it is stored, and
/// only the Shopper holds the key to decrypt it.
#[derive(Debug, Clone)]
pub struct PaymentInstrument {
    pub id: InstrumentId,
    pub encrypted_pan: Secret<Vec<u8>, EncryptedPanStrategy>,
    pub last_four: String,
    pub network: CardNetwork,
    pub expiry: String,
    pub tokenization: Option<TokenizationState>,
}

impl PaymentInstrument {
    pub fn is_tokenized(&self) -> bool {
        self.tokenization.is_some()
    }
}

/// Populated once the Network Tokenization Adapter successfully enrolls
/// this instrument (spec §3, §4.5).
#[derive(Debug, Clone)]
pub struct TokenizationState {
    pub network_token: String,
    pub token_reference: String,
    pub assurance_level: String,
    pub tokenized_at: OffsetDateTime,
}
