//! AP2 Consumer Agent (spec §4.4): mandate assembly and the device
//! authentication/signature binding that produces `user_authorization`.

use common_utils::pii::Email;
use domain_types::{
    errors::{ApiError, DomainResult},
    ids::{DeviceCredentialId, MandateId},
    mandate::{MandateContents, PaymentDetailsAmount, PaymentDetailsTotal, PaymentMandate, PaymentMethodDetails, PaymentResponse},
    money::Money,
    user::PaymentInstrument,
};
use ring::signature::{UnparsedPublicKey, ED25519};

use crate::credentials::CredentialsProvider;

pub struct Ap2ConsumerAgent {
    device_origin: String,
}

impl Ap2ConsumerAgent {
    pub fn new(device_origin: impl Into<String>) -> Self {
        Self {
            device_origin: device_origin.into(),
        }
    }

    /// Assembles the unsigned mandate contents for a cart total and
    /// instrument (spec §4.4 "Mandate assembly"). `token`/`cryptogram` are
    /// freshly generated unless the instrument is network-tokenized.
    pub fn assemble(
        &self,
        total: Money,
        instrument: &PaymentInstrument,
        payer_email: Email,
        payer_name: String,
        merchant_agent: String,
    ) -> MandateContents {
        let now = common_utils::date_time::now();
        let token = instrument
            .tokenization
            .as_ref()
            .map(|state| state.network_token.clone())
            .unwrap_or_else(generate_token);
        let cryptogram = generate_cryptogram();

        MandateContents {
            payment_mandate_id: MandateId::generate(),
            timestamp: now,
            payment_details_id: format!("pd_{}", nanoid::nanoid!(16)),
            payment_details_total: PaymentDetailsTotal {
                label: "Total".to_string(),
                amount: PaymentDetailsAmount {
                    currency: total.currency,
                    value: total.value,
                },
            },
            payment_response: PaymentResponse {
                request_id: format!("req_{}", nanoid::nanoid!(16)),
                method_name: "card".to_string(),
                details: PaymentMethodDetails {
                    token,
                    cryptogram,
                    card_last_four: instrument.last_four.clone(),
                    card_network: instrument.network,
                },
                payer_email,
                payer_name,
            },
            merchant_agent,
        }
    }

    /// Authentication (spec §4.4): issues a fresh challenge, has the device
    /// assert over (challenge, origin, mandate digest), verifies the
    /// assertion locally, then has the device sign the canonical mandate
    /// bytes directly — the signature the merchant's agent verifies.
    pub async fn authenticate_and_sign(
        &self,
        credentials: &CredentialsProvider,
        credential_id: &DeviceCredentialId,
        device_public_key: [u8; 32],
        contents: &MandateContents,
    ) -> DomainResult<Vec<u8>> {
        let canonical = contents
            .canonical_bytes()
            .map_err(|err| ApiError::internal(format!("mandate could not be canonicalized: {err}")))?;
        let digest = ring::digest::digest(&ring::digest::SHA256, &canonical);

        let mut challenge = [0u8; 32];
        ring::rand::SecureRandom::fill(&ring::rand::SystemRandom::new(), &mut challenge)
            .map_err(|_| ApiError::internal("failed to generate authentication challenge"))?;

        let mut assertion_payload = Vec::with_capacity(32 + self.device_origin.len() + digest.as_ref().len());
        assertion_payload.extend_from_slice(&challenge);
        assertion_payload.extend_from_slice(self.device_origin.as_bytes());
        assertion_payload.extend_from_slice(digest.as_ref());

        let assertion = credentials.sign_with_device(credential_id, &assertion_payload).await?;
        UnparsedPublicKey::new(&ED25519, &device_public_key)
            .verify(&assertion_payload, &assertion)
            .map_err(|_| ApiError::internal("device assertion failed local verification"))?;

        credentials.sign_with_device(credential_id, &canonical).await
    }
}

pub fn into_mandate(contents: MandateContents, user_authorization: Vec<u8>) -> PaymentMandate {
    PaymentMandate {
        contents,
        user_authorization,
    }
}

fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..16).map(|_| rng.gen_range(0..10).to_string()).collect()
}

fn generate_cryptogram() -> String {
    const HEX: &[u8] = b"0123456789ABCDEF";
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..32).map(|_| HEX[rng.gen_range(0..HEX.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_enums::{CardNetwork, Currency};
    use common_utils::pii::EncryptedPanStrategy;
    use domain_types::ids::InstrumentId;
    use masking::Secret;

    fn instrument() -> PaymentInstrument {
        PaymentInstrument {
            id: InstrumentId::generate(),
            encrypted_pan: Secret::<Vec<u8>, EncryptedPanStrategy>::new(vec![0; 4]),
            last_four: "4242".into(),
            network: CardNetwork::Visa,
            expiry: "12/30".into(),
            tokenization: None,
        }
    }

    #[test]
    fn assembled_mandate_carries_well_formed_token_and_cryptogram() {
        let agent = Ap2ConsumerAgent::new("https://shopper-demo.example");
        let contents = agent.assemble(
            Money::new(Currency::Sgd, rust_decimal::Decimal::new(998, 2)),
            &instrument(),
            Email::try_from("a@example.com".to_string()).unwrap(),
            "A Shopper".to_string(),
            "merchant-agent-1".to_string(),
        );
        assert!(domain_types::mandate::is_valid_token(&contents.payment_response.details.token));
        assert!(domain_types::mandate::is_valid_cryptogram(&contents.payment_response.details.cryptogram));
    }

    #[test]
    fn tokenized_instrument_reuses_the_network_token() {
        let agent = Ap2ConsumerAgent::new("https://shopper-demo.example");
        let mut instrument = instrument();
        instrument.tokenization = Some(domain_types::user::TokenizationState {
            network_token: "9999999999999999".to_string(),
            token_reference: "ref_1".to_string(),
            assurance_level: "high".to_string(),
            tokenized_at: common_utils::date_time::now(),
        });
        let contents = agent.assemble(
            Money::new(Currency::Sgd, rust_decimal::Decimal::new(998, 2)),
            &instrument,
            Email::try_from("a@example.com".to_string()).unwrap(),
            "A Shopper".to_string(),
            "merchant-agent-1".to_string(),
        );
        assert_eq!(contents.payment_response.details.token, "9999999999999999");
    }
}
