//! `PaymentReceipt` — issued by the Merchant's AP2 agent once a session
//! reaches `complete` (spec §3, §4.2 step 5).

use time::OffsetDateTime;

use crate::{ids::ReceiptId, money::Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SettlementStatus {
    Captured,
    Declined,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentReceipt {
    pub id: ReceiptId,
    pub settlement_status: SettlementStatus,
    pub settled_amount: Money,
    pub network_reference: String,
    pub issued_at: OffsetDateTime,
    /// Optional signature from the merchant's DID key over the receipt's
    /// canonical bytes (spec §4.2 step 5). `None` when no signing
    /// endpoint is configured.
    pub signature: Option<Vec<u8>>,
}

impl PaymentReceipt {
    pub fn captured(network_reference: impl Into<String>, amount: Money, issued_at: OffsetDateTime) -> Self {
        Self {
            id: ReceiptId::generate(),
            settlement_status: SettlementStatus::Captured,
            settled_amount: amount,
            network_reference: network_reference.into(),
            issued_at,
            signature: None,
        }
    }

    pub fn declined(amount: Money, issued_at: OffsetDateTime) -> Self {
        Self {
            id: ReceiptId::generate(),
            settlement_status: SettlementStatus::Declined,
            settled_amount: amount,
            network_reference: String::new(),
            issued_at,
            signature: None,
        }
    }

    /// Deterministic bytes a merchant signing key signs over — same
    /// lexicographic-JSON discipline as the mandate canonicalization.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, common_utils::errors::ParsingError> {
        let value = serde_json::json!({
            "id": self.id.as_str(),
            "settlement_status": self.settlement_status,
            "settled_amount": { "currency": self.settled_amount.currency, "value": self.settled_amount.value },
            "network_reference": self.network_reference,
        });
        common_utils::canonical::canonicalize(&value, &["/settled_amount/value"])
    }
}
