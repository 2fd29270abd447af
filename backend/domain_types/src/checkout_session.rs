//! `CheckoutSession` and its line items (spec §3, §4.1).

use common_enums::{Currency, SessionStatus};
use common_utils::pii::Email;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    ids::{ChallengeId, SessionId},
    mandate::PaymentMandate,
    money::Money,
    receipt::PaymentReceipt,
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn extended_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Pluggable tax policy (spec §4.1: "tax policy pluggable, default 0").
pub trait TaxPolicy: Send + Sync {
    fn tax_for(&self, subtotal: Decimal, currency: Currency) -> Decimal;
}

/// Default policy (spec §4.1): no tax computed.
pub struct NoTax;

impl TaxPolicy for NoTax {
    fn tax_for(&self, _subtotal: Decimal, _currency: Currency) -> Decimal {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: SessionId,
    pub line_items: Vec<LineItem>,
    pub buyer_email: Email,
    pub currency: Currency,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: SessionStatus,
    pub mandate: Option<PaymentMandate>,
    pub user_authorization: Option<Vec<u8>>,
    pub active_challenge: Option<ChallengeId>,
    pub receipt: Option<PaymentReceipt>,
    /// Set when `status` becomes `failed`; lets a replayed Complete on a
    /// `failed` session return the same error kind it returned the first
    /// time (spec §8 invariant 10).
    pub failure_reason: Option<common_enums::ErrorKind>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CheckoutSession {
    pub fn create(
        line_items: Vec<LineItem>,
        buyer_email: Email,
        currency: Currency,
        tax_policy: &dyn TaxPolicy,
        now: OffsetDateTime,
    ) -> Self {
        let subtotal = line_items.iter().fold(Decimal::ZERO, |acc, item| acc + item.extended_price());
        let tax = tax_policy.tax_for(subtotal, currency);
        let total = subtotal + tax;
        Self {
            id: SessionId::generate(),
            line_items,
            buyer_email,
            currency,
            subtotal,
            tax,
            total,
            status: SessionStatus::Incomplete,
            mandate: None,
            user_authorization: None,
            active_challenge: None,
            receipt: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_money(&self) -> Money {
        Money::new(self.currency, self.total)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
