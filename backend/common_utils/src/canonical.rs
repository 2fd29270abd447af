//! Deterministic JSON canonicalization.
//!
//! Per spec §9: both the Shopper's consumer agent (signer) and the
//! Merchant's AP2 agent (verifier) must derive byte-identical encodings of
//! `PaymentMandate.contents` or authorization verification fails with
//! `INVALID_AUTHORIZATION` even though the mandate itself is fine. The rule
//! is: object keys sorted lexicographically at every nesting level, no
//! insignificant whitespace, and monetary amounts rendered with exactly two
//! decimal digits using banker's rounding (round-half-to-even), everywhere
//! else numbers render via `serde_json`'s default `Display`.
//!
//! Only a fixed set of JSON pointer paths are treated as "monetary" for the
//! rounding rule — the caller passes them in, rather than this module
//! guessing from field names.

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde_json::Value;

use crate::errors::ParsingError;

/// Serialize `value` to its canonical byte representation, rounding every
/// number reachable via one of `monetary_pointers` (RFC 6901 JSON Pointers,
/// e.g. `/payment_details_total/amount/value`) to 2 decimal places using
/// banker's rounding before encoding.
pub fn canonicalize(value: &Value, monetary_pointers: &[&str]) -> Result<Vec<u8>, ParsingError> {
    let mut rounded = value.clone();
    for pointer in monetary_pointers {
        if let Some(slot) = rounded.pointer_mut(pointer) {
            if let Some(num) = slot.as_f64() {
                let decimal = Decimal::from_f64(num)
                    .ok_or(ParsingError::CanonicalizationError)?
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointTowardEven);
                *slot = serde_json::Number::from_f64(decimal_to_f64(decimal))
                    .map(Value::Number)
                    .ok_or(ParsingError::CanonicalizationError)?;
            }
        }
    }
    let sorted = sort_keys(rounded);
    serde_json::to_vec(&sorted).map_err(|_| ParsingError::CanonicalizationError)
}

fn decimal_to_f64(decimal: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    decimal.to_f64().unwrap_or(0.0)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_level() {
        let value = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let out = canonicalize(&value, &[]).unwrap();
        assert_eq!(out, br#"{"a":{"y":2,"z":1},"b":1}"#);
    }

    #[test]
    fn rounds_monetary_fields_half_to_even() {
        let value = json!({"amount": {"value": 9.985}});
        let out = canonicalize(&value, &["/amount/value"]).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("9.98"), "expected banker's rounding, got {s}");
    }

    #[test]
    fn identical_inputs_canonicalize_identically() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(canonicalize(&a, &[]).unwrap(), canonicalize(&b, &[]).unwrap());
    }
}
