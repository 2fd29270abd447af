//! Low-level parsing/validation errors shared by both services. Domain-level
//! errors (spec §7 taxonomy) live in `domain_types::errors`; this module
//! only covers the primitive types defined in this crate (`pii::Email`, the
//! canonicalization routine, base64 decoding).

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value for `{field_name}`: {message}")]
    InvalidValue { field_name: &'static str, message: String },
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("failed to parse email address")]
    EmailParsingError,
    #[error("failed to decode base64: {0}")]
    Base64DecodeError(String),
    #[error("failed to serialize value for canonicalization")]
    CanonicalizationError,
}
