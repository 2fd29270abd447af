//! Personal Identifiable Information protection.
//!
//! Every field that must never reach a log line or an outbound request in
//! cleartext (spec §8 invariant 6: raw PAN, spec §5: OAuth1 signing keys,
//! device signatures) is wrapped in a [`masking::Secret`] with a
//! [`masking::Strategy`] that controls what `{:?}`/`{}` actually print.

use std::{convert::AsRef, fmt, ops, str::FromStr};

use error_stack::ResultExt;
use masking::{ExposeInterface, Secret, Strategy, WithType};

use crate::errors::{self, ValidationError};

/// Strategy for masking an email address, keeping the domain visible for
/// diagnostics while hiding the local part.
#[derive(Debug, Copy, Clone)]
pub enum EmailStrategy {}

impl<T> Strategy<T> for EmailStrategy
where
    T: AsRef<str> + fmt::Debug,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();
        match val_str.split_once('@') {
            Some((a, b)) => write!(f, "{}@{}", "*".repeat(a.len()), b),
            None => WithType::fmt(val, f),
        }
    }
}

/// Case-folded email address used as the user identity (spec §3).
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Email(Secret<String, EmailStrategy>);

impl Email {
    pub fn as_str(&self) -> &str {
        self.0.peek()
    }
}

impl ExposeInterface<Secret<String, EmailStrategy>> for Email {
    fn expose(self) -> Secret<String, EmailStrategy> {
        self.0
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0.expose()
    }
}

impl TryFrom<String> for Email {
    type Error = error_stack::Report<errors::ParsingError>;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).change_context(errors::ParsingError::EmailParsingError)
    }
}

impl ops::Deref for Email {
    type Target = Secret<String, EmailStrategy>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Email {
    type Err = error_stack::Report<ValidationError>;

    fn from_str(email: &str) -> Result<Self, Self::Err> {
        let case_folded = email.trim().to_lowercase();
        if case_folded.contains('@') && case_folded.len() > 3 && !case_folded.starts_with('@') {
            Ok(Self(Secret::new(case_folded)))
        } else {
            Err(ValidationError::InvalidValue {
                field_name: "email",
                message: "not a well-formed email address".into(),
            }
            .into())
        }
    }
}

/// Masking strategy for an encrypted-at-rest PAN: never prints cleartext,
/// only the ciphertext length, so even an accidental `{:?}` of the
/// `PaymentInstrument` cannot leak payment data into a log line.
#[derive(Debug)]
pub enum EncryptedPanStrategy {}

impl<T> Strategy<T> for EncryptedPanStrategy
where
    T: AsRef<[u8]>,
{
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** encrypted PAN, {} bytes ***", value.as_ref().len())
    }
}

/// Masking strategy for raw signature/assertion bytes — useful for
/// debugging shapes without ever printing the bytes that bind a user to a
/// mandate.
#[derive(Debug)]
pub enum SignatureStrategy {}

impl<T> Strategy<T> for SignatureStrategy
where
    T: AsRef<[u8]>,
{
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** signature, {} bytes ***", value.as_ref().len())
    }
}
