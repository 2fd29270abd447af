//! URL-safe base64 without padding on the wire (spec §6 "Base64
//! discipline"), accepting both padded and unpadded input on decode.

use base64::{
    alphabet,
    engine::{general_purpose::NO_PAD, GeneralPurpose},
    Engine,
};

use crate::errors::ParsingError;

const URL_SAFE_NO_PAD: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, NO_PAD);

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes URL-safe base64, accepting input with or without `=` padding.
pub fn decode(value: &str) -> Result<Vec<u8>, ParsingError> {
    let trimmed = value.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| ParsingError::Base64DecodeError(e.to_string()))
}
