//! Deterministic risk adjudication (spec §4.2 step 3, §8 invariant 7).
//!
//! The draw is seeded from `(mandate_id, merchant_id)` via a fixed hash
//! rather than an unseeded RNG, so a replay of the same mandate against the
//! same merchant always yields the same decision and the step-up path stays
//! testable.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy)]
pub struct RiskPolicy {
    pub step_up_enabled: bool,
    pub threshold_small: f64,
    pub threshold_large: f64,
    pub amount_threshold: Decimal,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            step_up_enabled: false,
            threshold_small: 0.10,
            threshold_large: 0.30,
            amount_threshold: Decimal::new(10000, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskDecision {
    Approve,
    StepUp,
}

fn seed_for(mandate_id: &str, merchant_id: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    mandate_id.hash(&mut hasher);
    merchant_id.hash(&mut hasher);
    hasher.finish()
}

/// A deterministic draw in `[0, 1)` for `(mandate_id, merchant_id)`.
pub fn deterministic_draw(mandate_id: &str, merchant_id: &str) -> f64 {
    let mut rng = Pcg64Mcg::seed_from_u64(seed_for(mandate_id, merchant_id));
    rng.gen::<f64>()
}

impl RiskPolicy {
    pub fn adjudicate(&self, mandate_id: &str, merchant_id: &str, total: Decimal) -> RiskDecision {
        if !self.step_up_enabled {
            return RiskDecision::Approve;
        }
        let draw = deterministic_draw(mandate_id, merchant_id);
        let threshold = if total >= self.amount_threshold {
            self.threshold_large
        } else {
            self.threshold_small
        };
        if draw < threshold.min(1.0) {
            RiskDecision::StepUp
        } else {
            RiskDecision::Approve
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_decision() {
        let policy = RiskPolicy {
            step_up_enabled: true,
            ..RiskPolicy::default()
        };
        let first = policy.adjudicate("mandate_1", "merchant_1", Decimal::new(998, 2));
        let second = policy.adjudicate("mandate_1", "merchant_1", Decimal::new(998, 2));
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_policy_always_approves() {
        let policy = RiskPolicy {
            step_up_enabled: false,
            ..RiskPolicy::default()
        };
        for i in 0..20 {
            let mandate_id = format!("mandate_{i}");
            assert_eq!(
                policy.adjudicate(&mandate_id, "merchant_1", Decimal::new(998, 2)),
                RiskDecision::Approve
            );
        }
    }

    #[test]
    fn draw_is_deterministic_and_bounded() {
        let draw_a = deterministic_draw("m1", "merch1");
        let draw_b = deterministic_draw("m1", "merch1");
        assert_eq!(draw_a, draw_b);
        assert!((0.0..1.0).contains(&draw_a));
    }
}
