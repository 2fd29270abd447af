//! Authenticated symmetric encryption for PANs at rest (spec §4.4
//! Storage: "PAN is encrypted with an authenticated symmetric cipher;
//! only S can decrypt"). AES-256-GCM via `ring`, key loaded once at
//! startup and held in memory for the process lifetime (spec §5).

use domain_types::errors::{ApiError, DomainResult};
use masking::{ExposeInterface, Secret};
use ring::aead::{self, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

pub struct PanCipher {
    key_bytes: [u8; 32],
    rng: SystemRandom,
}

struct SingleUseNonce(Option<[u8; NONCE_LEN]>);

impl NonceSequence for SingleUseNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.0.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

impl PanCipher {
    /// `key` is the base64 (URL-safe, unpadded) form of a 32-byte key,
    /// as carried in configuration.
    pub fn from_base64(key: &Secret<String>) -> DomainResult<Self> {
        let decoded = common_utils::b64::decode(key.clone().expose().as_str())
            .map_err(|err| ApiError::internal(format!("malformed pan_encryption_key: {err}")))?;
        let key_bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| ApiError::internal("pan_encryption_key must decode to exactly 32 bytes"))?;
        Ok(Self {
            key_bytes,
            rng: SystemRandom::new(),
        })
    }

    /// Encrypts `pan`, returning `nonce || ciphertext || tag`.
    pub fn encrypt(&self, pan: &Secret<String>) -> DomainResult<Vec<u8>> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key_bytes)
            .map_err(|_| ApiError::internal("failed to construct AES-256-GCM key"))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| ApiError::internal("failed to generate encryption nonce"))?;

        let mut sealing_key = aead::SealingKey::new(unbound, SingleUseNonce(Some(nonce_bytes)));
        let mut in_out = pan.clone().expose().into_bytes();
        sealing_key
            .seal_in_place_append_tag(aead::Aad::empty(), &mut in_out)
            .map_err(|_| ApiError::internal("PAN encryption failed"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&in_out);
        Ok(out)
    }

    /// Decodes a value produced by [`Self::encrypt`]. Never required to
    /// participate in a mandate (spec §4.4); used only for diagnostics
    /// and tests here.
    pub fn decrypt(&self, ciphertext: &[u8]) -> DomainResult<String> {
        if ciphertext.len() < NONCE_LEN {
            return Err(ApiError::internal("ciphertext shorter than nonce"));
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        let unbound = UnboundKey::new(&AES_256_GCM, &self.key_bytes)
            .map_err(|_| ApiError::internal("failed to construct AES-256-GCM key"))?;
        let mut opening_key = aead::OpeningKey::new(unbound, SingleUseNonce(Some(nonce)));

        let mut in_out = sealed.to_vec();
        let plaintext = opening_key
            .open_in_place(aead::Aad::empty(), &mut in_out)
            .map_err(|_| ApiError::internal("PAN decryption failed"))?;
        String::from_utf8(plaintext.to_vec()).map_err(|_| ApiError::internal("decrypted PAN is not valid utf8"))
    }
}
