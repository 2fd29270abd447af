//! Utilities shared by the merchant and shopper services: id generation,
//! timestamps, base64 discipline, canonical JSON encoding, and PII masking.

pub mod b64;
pub mod canonical;
pub mod consts;
pub mod date_time;
pub mod errors;
pub mod fp_utils;
#[macro_use]
pub mod macros;
pub mod pii;

pub use masking;
