//! Monetary amounts. Spec §3/§4.1 specifies totals as decimal values
//! compared with a 1e-6 tolerance, so `Money` carries a `rust_decimal::Decimal`
//! rather than integer minor units (the one place integer minor units are
//! mandated — `/ucp/products/search` prices, spec §6 — is a plain `i64` on
//! that DTO, independent of this type).

use common_enums::Currency;
use rust_decimal::{prelude::ToPrimitive, Decimal};

/// Tolerance used when comparing a mandate's total against a session's
/// total (spec §4.1 Update).
pub const TOTAL_COMPARISON_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Money {
    pub currency: Currency,
    pub value: Decimal,
}

impl Money {
    pub fn new(currency: Currency, value: Decimal) -> Self {
        Self { currency, value }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, Decimal::ZERO)
    }

    /// True when both the currency matches and the decimal values agree
    /// within `TOTAL_COMPARISON_TOLERANCE`.
    pub fn approx_eq(&self, other: &Self) -> bool {
        if self.currency != other.currency {
            return false;
        }
        let diff = (self.value - other.value).abs();
        diff.to_f64().unwrap_or(f64::MAX) < TOTAL_COMPARISON_TOLERANCE
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "adding mismatched currencies");
        Money::new(self.currency, self.value + rhs.value)
    }
}
