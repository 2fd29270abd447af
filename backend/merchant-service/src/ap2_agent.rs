//! AP2 Merchant Agent (spec §4.2) — the five-step Complete workflow:
//! signature validation, mandate integrity, risk adjudication, step-up
//! verification, receipt issuance.

use std::sync::Arc;

use common_enums::{ChallengeStatus, ErrorKind, SessionStatus, StepUpMethod};
use domain_types::{
    challenge::StepUpChallenge,
    checkout_session::CheckoutSession,
    errors::{ApiError, DomainResult},
    ids::{ChallengeId, SessionId},
    mandate::{is_valid_cryptogram, is_valid_last_four, is_valid_token, PaymentMandate},
    receipt::PaymentReceipt,
    risk::{RiskDecision, RiskPolicy},
};
use interfaces::{challenge_store::ChallengeStore, device_registry::DeviceRegistry, session_store::SessionStore, signer::ReceiptSigner};
use rand::Rng;
use ring::{
    digest::{digest, SHA256},
    rand::{SecureRandom, SystemRandom},
    signature::{UnparsedPublicKey, ED25519},
};

/// What a Complete call produced. Every variant is surfaced as a 200
/// response carrying a session snapshot and a `payment_status` — only
/// protocol-level misuse (wrong state, unknown session) is a hard error
/// (spec §6 "Step-up wire shape").
pub enum CompleteOutcome {
    Success(CheckoutSession),
    StepUpRequired(CheckoutSession, ChallengeId),
    /// Session moved to `failed`; carries the terminal error kind.
    Failed(CheckoutSession, ErrorKind),
    /// Session remains `requires_escalation`; the supplied code was wrong
    /// but attempts remain.
    InvalidOtp(CheckoutSession),
}

pub struct Ap2MerchantAgent {
    sessions: Arc<dyn SessionStore>,
    challenges: Arc<dyn ChallengeStore>,
    devices: Arc<dyn DeviceRegistry>,
    signer: Arc<dyn ReceiptSigner>,
    risk_policy: RiskPolicy,
    merchant_id: String,
    /// Demo mode stores the generated OTP in plaintext and echoes it back
    /// to the caller (spec §4.2 step 4); outside demo mode only a salted
    /// hash is retained and the caller must learn the code out of band.
    demo_mode: bool,
}

impl Ap2MerchantAgent {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        challenges: Arc<dyn ChallengeStore>,
        devices: Arc<dyn DeviceRegistry>,
        signer: Arc<dyn ReceiptSigner>,
        risk_policy: RiskPolicy,
        merchant_id: impl Into<String>,
        demo_mode: bool,
    ) -> Self {
        Self {
            sessions,
            challenges,
            devices,
            signer,
            risk_policy,
            merchant_id: merchant_id.into(),
            demo_mode,
        }
    }

    pub async fn complete(&self, id: &SessionId, otp_code: Option<String>) -> DomainResult<CompleteOutcome> {
        loop {
            let versioned = self.sessions.get(id).await?;
            let session = versioned.session;

            if session.is_terminal() {
                // Idempotent: replay the cached terminal outcome (spec §5, §8 invariant 10).
                return Ok(self.cached_outcome(session));
            }

            let (next_session, outcome_kind) = match session.status {
                SessionStatus::ReadyForComplete => self.run_initial_checks(session).await?,
                SessionStatus::RequiresEscalation => self.run_step_up(session, otp_code.clone()).await?,
                _ => return Err(ApiError::invalid_state(format!("session {id} is not ready to complete"))),
            };

            match self
                .sessions
                .compare_and_set(id, versioned.version, next_session.clone())
                .await
            {
                Ok(updated) => return Ok(Self::outcome_for(updated.session, outcome_kind)),
                Err(err) if err.kind == ErrorKind::InvalidState => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn cached_outcome(&self, session: CheckoutSession) -> CompleteOutcome {
        match session.status {
            SessionStatus::Complete => CompleteOutcome::Success(session),
            _ => {
                let kind = session.failure_reason.unwrap_or(ErrorKind::Internal);
                CompleteOutcome::Failed(session, kind)
            }
        }
    }

    fn outcome_for(session: CheckoutSession, kind: OutcomeKind) -> CompleteOutcome {
        match kind {
            OutcomeKind::Success => CompleteOutcome::Success(session),
            OutcomeKind::StepUpRequired(challenge_id) => CompleteOutcome::StepUpRequired(session, challenge_id),
            OutcomeKind::Failed(error_kind) => CompleteOutcome::Failed(session, error_kind),
            OutcomeKind::InvalidOtp => CompleteOutcome::InvalidOtp(session),
        }
    }

    /// Steps 1-3: signature validation, mandate integrity, risk adjudication.
    async fn run_initial_checks(&self, mut session: CheckoutSession) -> DomainResult<(CheckoutSession, OutcomeKind)> {
        let now = common_utils::date_time::now();
        let mandate = session
            .mandate
            .clone()
            .ok_or_else(|| ApiError::internal("ready_for_complete session has no attached mandate"))?;

        if let Err(kind) = self.validate_signature(&mandate).await {
            return Ok(self.fail(session, kind, now));
        }
        if let Err(kind) = Self::validate_integrity(&session, &mandate) {
            return Ok(self.fail(session, kind, now));
        }

        let total = session.total;
        let decision = self
            .risk_policy
            .adjudicate(mandate.contents.payment_mandate_id.as_str(), &self.merchant_id, total);

        match decision {
            RiskDecision::Approve => {
                let (receipt, _) = self.issue_receipt(&session, now).await;
                session.receipt = Some(receipt);
                session.status = SessionStatus::Complete;
                session.updated_at = now;
                Ok((session, OutcomeKind::Success))
            }
            RiskDecision::StepUp => {
                let mut salt = [0u8; 16];
                SystemRandom::new()
                    .fill(&mut salt)
                    .map_err(|_| ApiError::internal("failed to generate challenge salt"))?;
                let (plaintext_otp, expected_otp_hash) = if self.demo_mode {
                    // Demo mode always issues the well-known code from spec §8's
                    // seed scenario, so it can be reproduced without a side
                    // channel to the challenge store.
                    (Some(common_utils::consts::DEMO_OTP_CODE.to_string()), Vec::new())
                } else {
                    let code = Self::generate_otp();
                    (None, Self::hash_otp(&code, &salt))
                };
                let challenge = StepUpChallenge {
                    id: ChallengeId::generate(),
                    session_id: session.id.clone(),
                    method: StepUpMethod::Otp,
                    status: ChallengeStatus::Pending,
                    plaintext_otp,
                    expected_otp_hash,
                    salt,
                    attempts_remaining: common_utils::consts::CHALLENGE_MAX_ATTEMPTS,
                    created_at: now,
                    expires_at: now + time::Duration::seconds(common_utils::consts::CHALLENGE_TTL_SECS),
                };
                let challenge_id = challenge.id.clone();
                self.challenges.create(challenge).await?;
                session.active_challenge = Some(challenge_id.clone());
                session.status = SessionStatus::RequiresEscalation;
                session.updated_at = now;
                Ok((session, OutcomeKind::StepUpRequired(challenge_id)))
            }
        }
    }

    /// Step 4: step-up verification for a session already `requires_escalation`.
    async fn run_step_up(
        &self,
        mut session: CheckoutSession,
        otp_code: Option<String>,
    ) -> DomainResult<(CheckoutSession, OutcomeKind)> {
        let now = common_utils::date_time::now();
        let challenge_id = session
            .active_challenge
            .clone()
            .ok_or_else(|| ApiError::internal("requires_escalation session has no active challenge"))?;
        let mut challenge = self.challenges.get(&challenge_id).await?;

        if challenge.is_expired(now) {
            return Ok(self.fail(session, ErrorKind::ChallengeExpired, now));
        }

        let Some(code) = otp_code else {
            return Err(ApiError::invalid_input("otp_code is required to complete an escalated session"));
        };
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::invalid_input("otp_code must be a 6-digit numeric code"));
        }

        if Self::otp_is_valid(&challenge, &code) {
            challenge.approve();
            self.challenges.save(challenge).await?;
            let (receipt, _) = self.issue_receipt(&session, now).await;
            session.receipt = Some(receipt);
            session.status = SessionStatus::Complete;
            session.updated_at = now;
            return Ok((session, OutcomeKind::Success));
        }

        challenge.record_failed_attempt();
        let exhausted = challenge.is_exhausted();
        self.challenges.save(challenge).await?;

        if exhausted {
            Ok(self.fail(session, ErrorKind::ChallengeExhausted, now))
        } else {
            session.updated_at = now;
            Ok((session, OutcomeKind::InvalidOtp))
        }
    }

    /// Step 4 (spec §4.2): compares against the plaintext code in demo mode
    /// or the salted hash otherwise — never "any well-formed code".
    fn otp_is_valid(challenge: &StepUpChallenge, code: &str) -> bool {
        challenge.code_matches(code, Self::hash_otp)
    }

    fn generate_otp() -> String {
        let mut rng = rand::thread_rng();
        (0..6).map(|_| rng.gen_range(0..10).to_string()).collect()
    }

    fn hash_otp(code: &str, salt: &[u8; 16]) -> Vec<u8> {
        let mut input = Vec::with_capacity(salt.len() + code.len());
        input.extend_from_slice(salt);
        input.extend_from_slice(code.as_bytes());
        digest(&SHA256, &input).as_ref().to_vec()
    }

    async fn validate_signature(&self, mandate: &PaymentMandate) -> Result<(), ErrorKind> {
        let public_key = self
            .devices
            .public_key_for(&mandate.contents.payment_response.payer_email)
            .await
            .map_err(|_| ErrorKind::InvalidAuthorization)?;
        let canonical = mandate
            .contents
            .canonical_bytes()
            .map_err(|_| ErrorKind::MalformedMandate)?;
        UnparsedPublicKey::new(&ED25519, &public_key)
            .verify(&canonical, &mandate.user_authorization)
            .map_err(|_| ErrorKind::InvalidAuthorization)
    }

    fn validate_integrity(session: &CheckoutSession, mandate: &PaymentMandate) -> Result<(), ErrorKind> {
        let declared = domain_types::money::Money::new(
            mandate.contents.payment_details_total.amount.currency,
            mandate.contents.payment_details_total.amount.value,
        );
        if !declared.approx_eq(&session.total_money()) {
            return Err(ErrorKind::MalformedMandate);
        }
        let details = &mandate.contents.payment_response.details;
        if !is_valid_token(&details.token)
            || !is_valid_cryptogram(&details.cryptogram)
            || !is_valid_last_four(&details.card_last_four)
        {
            return Err(ErrorKind::MalformedMandate);
        }
        Ok(())
    }

    fn fail(&self, mut session: CheckoutSession, kind: ErrorKind, now: time::OffsetDateTime) -> (CheckoutSession, OutcomeKind) {
        session.receipt = Some(PaymentReceipt::declined(session.total_money(), now));
        session.status = SessionStatus::Failed;
        session.failure_reason = Some(kind);
        session.updated_at = now;
        (session, OutcomeKind::Failed(kind))
    }

    async fn issue_receipt(&self, session: &CheckoutSession, now: time::OffsetDateTime) -> (PaymentReceipt, Option<Vec<u8>>) {
        let confirmation_id = format!("conf_{}", nanoid::nanoid!(20));
        let mut receipt = PaymentReceipt::captured(confirmation_id, session.total_money(), now);
        if let Ok(bytes) = receipt.canonical_bytes() {
            match self.signer.sign_receipt(&bytes).await {
                Ok(signature) => receipt.signature = signature,
                Err(error) => {
                    tracing::warn!(?error, "receipt signing failed, issuing an unsigned receipt");
                }
            }
        }
        let signature = receipt.signature.clone();
        (receipt, signature)
    }
}

enum OutcomeKind {
    Success,
    StepUpRequired(ChallengeId),
    Failed(ErrorKind),
    InvalidOtp,
}
