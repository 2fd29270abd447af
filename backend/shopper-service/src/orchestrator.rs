//! Checkout Orchestrator (spec §4.3): the only place on the Shopper side
//! that mutates mandate/session state. Drives the merchant's session
//! lifecycle from the user's cart through to a settled receipt.

use std::{collections::HashMap, sync::Arc};

use common_enums::Currency;
use common_utils::pii::Email;
use domain_types::{
    api::{CreateSessionRequest, LineItemRequest, PaymentMandateWire, ReceiptView},
    errors::{ApiError, DomainResult},
    ids::{DeviceCredentialId, InstrumentId, SessionId},
    mandate::MandateContents,
    money::Money,
};
use interfaces::tokenization::{AuthenticateOutcome, AuthenticateRequest, TokenizationAdapter, VerifyRequest};
use tokio::sync::Mutex;

use crate::{ap2_consumer::Ap2ConsumerAgent, credentials::CredentialsProvider, merchant_client::MerchantClient};

pub struct PrepareResult {
    pub session_id: SessionId,
    pub total: Money,
    pub card_last_four: String,
}

#[derive(Debug)]
pub enum PurchaseOutcome {
    Success(ReceiptView),
    OtpRequired,
    InvalidOtp,
    Failed(String),
}

struct InFlight {
    buyer_email: Email,
    instrument_id: InstrumentId,
    credential_id: DeviceCredentialId,
    device_public_key: [u8; 32],
    contents: MandateContents,
}

pub struct CheckoutOrchestrator {
    credentials: Arc<CredentialsProvider>,
    consumer_agent: Ap2ConsumerAgent,
    merchant: Arc<MerchantClient>,
    tokenization: Arc<dyn TokenizationAdapter>,
    merchant_id: Mutex<Option<String>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl CheckoutOrchestrator {
    pub fn new(
        credentials: Arc<CredentialsProvider>,
        consumer_agent: Ap2ConsumerAgent,
        merchant: Arc<MerchantClient>,
        tokenization: Arc<dyn TokenizationAdapter>,
    ) -> Self {
        Self {
            credentials,
            consumer_agent,
            merchant,
            tokenization,
            merchant_id: Mutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a session on M and assembles an unsigned mandate bound to the
    /// session total and the user's default instrument (spec §4.3).
    pub async fn prepare(&self, buyer_email: Email, line_items: Vec<LineItemRequest>, currency: Currency) -> DomainResult<PrepareResult> {
        let user = self.credentials.user(&buyer_email).await?;
        let instrument = user
            .default_instrument()
            .cloned()
            .ok_or_else(|| ApiError::invalid_state("user has no payment instrument on file"))?;
        let credential = user
            .device_credentials
            .first()
            .cloned()
            .ok_or_else(|| ApiError::invalid_state("user has no device credential on file"))?;

        let session = self
            .merchant
            .create_session(CreateSessionRequest {
                line_items,
                buyer_email: buyer_email.clone(),
                currency,
            })
            .await?;

        let merchant_agent = self.merchant_agent_id().await?;
        let total = Money::new(session.currency, session.total);
        let contents = self
            .consumer_agent
            .assemble(total, &instrument, buyer_email.clone(), user.display_name.clone(), merchant_agent);

        self.in_flight.lock().await.insert(
            session.id.as_str().to_string(),
            InFlight {
                buyer_email,
                instrument_id: instrument.id.clone(),
                credential_id: credential.id.clone(),
                device_public_key: credential.public_key,
                contents,
            },
        );

        Ok(PrepareResult {
            session_id: session.id,
            total,
            card_last_four: instrument.last_four,
        })
    }

    /// Attaches the signed mandate via Update, then calls Complete.
    /// Idempotent: a repeated confirm on an already-complete session
    /// returns the cached receipt without re-signing (spec §4.3).
    pub async fn confirm(&self, session_id: &SessionId) -> DomainResult<PurchaseOutcome> {
        let entry = self.in_flight.lock().await.remove(session_id.as_str());

        let Some(entry) = entry else {
            let session = self.merchant.get_session(session_id).await?;
            return Ok(outcome_from_session(&session.status, session.receipt.as_ref(), None));
        };

        if let Some(instrument_outcome) = self.maybe_authenticate_tokenization(&entry).await? {
            if let PurchaseOutcome::Failed(_) = instrument_outcome {
                return Ok(instrument_outcome);
            }
        }

        let user_authorization = self
            .consumer_agent
            .authenticate_and_sign(&self.credentials, &entry.credential_id, entry.device_public_key, &entry.contents)
            .await?;

        let mandate = crate::ap2_consumer::into_mandate(entry.contents.clone(), user_authorization);
        self.merchant.update_session(session_id, PaymentMandateWire::from(&mandate)).await?;

        let response = self.merchant.complete_session(session_id, None).await?;
        let outcome = outcome_from_session(&response.session.status, response.session.receipt.as_ref(), response.payment_status.error_message.as_deref());

        if matches!(outcome, PurchaseOutcome::OtpRequired | PurchaseOutcome::InvalidOtp) {
            self.in_flight.lock().await.insert(session_id.as_str().to_string(), entry);
        }

        Ok(outcome)
    }

    /// Calls Complete with the user-supplied OTP (spec §4.3).
    pub async fn submit_otp(&self, session_id: &SessionId, code: String) -> DomainResult<PurchaseOutcome> {
        let response = self.merchant.complete_session(session_id, Some(code)).await?;
        let outcome = outcome_from_session(&response.session.status, response.session.receipt.as_ref(), response.payment_status.error_message.as_deref());
        if !matches!(outcome, PurchaseOutcome::OtpRequired | PurchaseOutcome::InvalidOtp) {
            self.in_flight.lock().await.remove(session_id.as_str());
        }
        Ok(outcome)
    }

    /// Optional pre-Update authentication against the tokenization network
    /// (spec §4.5). Returns `None` when tokenization/step-up does not
    /// apply; network failures degrade to "proceed as if disabled" rather
    /// than failing the purchase.
    async fn maybe_authenticate_tokenization(&self, entry: &InFlight) -> DomainResult<Option<PurchaseOutcome>> {
        if !self.tokenization.is_enabled() {
            return Ok(None);
        }
        let user = self.credentials.user(&entry.buyer_email).await?;
        let Some(instrument) = user.payment_instruments.iter().find(|i| i.id == entry.instrument_id) else {
            return Ok(None);
        };
        if !instrument.is_tokenized() {
            return Ok(None);
        }

        let request = AuthenticateRequest {
            token: entry.contents.payment_response.details.token.clone(),
            amount: entry.contents.payment_details_total.amount.value,
            currency: entry.contents.payment_details_total.amount.currency,
            merchant_id: entry.contents.merchant_agent.clone(),
            transaction_id: entry.contents.payment_mandate_id.as_str().to_string(),
        };

        match self.tokenization.authenticate(request).await {
            Ok(AuthenticateOutcome::NotRequired) => Ok(None),
            Ok(AuthenticateOutcome::Required { .. }) => {
                // Demo harness has no interactive code-collection surface;
                // verify with the placeholder code the network accepts in
                // sandbox mode. A real UI would prompt the user here.
                let verified = self
                    .tokenization
                    .verify(VerifyRequest {
                        token: entry.contents.payment_response.details.token.clone(),
                        transaction_id: entry.contents.payment_mandate_id.as_str().to_string(),
                        code: "000000".to_string(),
                    })
                    .await?;
                if verified {
                    Ok(None)
                } else {
                    Ok(Some(PurchaseOutcome::Failed("network declined step-up authentication".to_string())))
                }
            }
            Err(error) => {
                tracing::warn!(?error, "tokenization authenticate call failed, proceeding as if disabled");
                Ok(None)
            }
        }
    }

    async fn merchant_agent_id(&self) -> DomainResult<String> {
        let mut cached = self.merchant_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }
        let id = self.merchant.discovery().await?.merchant.id.clone();
        *cached = Some(id.clone());
        Ok(id)
    }
}

fn outcome_from_session(
    status: &common_enums::SessionStatus,
    receipt: Option<&ReceiptView>,
    error_message: Option<&str>,
) -> PurchaseOutcome {
    match status {
        common_enums::SessionStatus::Complete => match receipt {
            Some(receipt) => PurchaseOutcome::Success(receipt.clone()),
            None => PurchaseOutcome::Failed("session completed without a receipt".to_string()),
        },
        common_enums::SessionStatus::RequiresEscalation => {
            if error_message.is_some_and(|message| message.starts_with("INVALID_OTP")) {
                PurchaseOutcome::InvalidOtp
            } else {
                PurchaseOutcome::OtpRequired
            }
        }
        common_enums::SessionStatus::Failed => {
            PurchaseOutcome::Failed(error_message.unwrap_or("payment could not be completed").to_string())
        }
        _ => PurchaseOutcome::Failed("unexpected session state".to_string()),
    }
}
