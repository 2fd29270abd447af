//! `PaymentMandate` — the AP2 extension wrapped inside a UCP checkout
//! session (spec §3, §6 "AP2 Mandate wire shape").

use common_enums::CardNetwork;
use common_utils::{errors::ParsingError, pii::Email};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::ids::MandateId;

/// Method-specific payment details inside `payment_response` (spec §3/§6).
/// `token`/`cryptogram` are freshly generated per mandate, never long-lived.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentMethodDetails {
    pub token: String,
    pub cryptogram: String,
    pub card_last_four: String,
    pub card_network: CardNetwork,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentResponse {
    pub request_id: String,
    pub method_name: String,
    pub details: PaymentMethodDetails,
    pub payer_email: Email,
    pub payer_name: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentDetailsAmount {
    pub currency: common_enums::Currency,
    pub value: Decimal,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentDetailsTotal {
    pub label: String,
    pub amount: PaymentDetailsAmount,
}

/// The part of a mandate the user's device signs over (spec §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MandateContents {
    pub payment_mandate_id: MandateId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub payment_details_id: String,
    pub payment_details_total: PaymentDetailsTotal,
    pub payment_response: PaymentResponse,
    pub merchant_agent: String,
}

impl MandateContents {
    /// Single canonicalization routine shared by the Shopper's consumer
    /// agent (to produce the bytes the device signs) and the Merchant's
    /// agent (to verify the signature). Disagreement between the two call
    /// sites is the first thing to check when `INVALID_AUTHORIZATION`
    /// appears unexpectedly (spec §9 Design Notes).
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ParsingError> {
        let value = serde_json::to_value(self).map_err(|_| ParsingError::CanonicalizationError)?;
        common_utils::canonical::canonicalize(&value, &["/payment_details_total/amount/value"])
    }
}

/// Composed by the Shopper, validated by the Merchant (spec §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentMandate {
    pub contents: MandateContents,
    /// URL-safe base64 on the wire (spec §6); kept decoded here.
    pub user_authorization: Vec<u8>,
}

impl PaymentMandate {
    /// Byte-identical comparison used for mandate-reuse and idempotent
    /// Update checks (spec §5).
    pub fn is_identical_to(&self, other: &PaymentMandate) -> bool {
        self.contents.payment_mandate_id == other.contents.payment_mandate_id
            && self.user_authorization == other.user_authorization
            && serde_json::to_value(&self.contents).ok() == serde_json::to_value(&other.contents).ok()
    }
}

/// Spec §8 invariant 5: token is 16 decimal digits, cryptogram 32 uppercase hex.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == 16 && token.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_cryptogram(cryptogram: &str) -> bool {
    cryptogram.len() == 32 && cryptogram.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_lowercase())
}

pub fn is_valid_last_four(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}
