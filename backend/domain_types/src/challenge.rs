//! `StepUpChallenge` — issued by the Merchant's AP2 agent when risk
//! adjudication requires escalation (spec §3, §4.2, §4.6).

use common_enums::{ChallengeStatus, StepUpMethod};
use time::OffsetDateTime;

use crate::ids::{ChallengeId, SessionId};

#[derive(Debug, Clone)]
pub struct StepUpChallenge {
    pub id: ChallengeId,
    pub session_id: SessionId,
    pub method: StepUpMethod,
    pub status: ChallengeStatus,
    /// The generated code, kept in plaintext only in demo mode so the demo
    /// surface can echo it back to the caller (spec §8 invariant 8). `None`
    /// outside demo mode, where `expected_otp_hash`/`salt` hold a salted
    /// hash instead and the plaintext is never retained.
    pub plaintext_otp: Option<String>,
    /// Salted hash of the generated code, populated outside demo mode.
    pub expected_otp_hash: Vec<u8>,
    pub salt: [u8; 16],
    pub attempts_remaining: u8,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl StepUpChallenge {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    /// Records a failed attempt, moving the challenge to `Declined` once
    /// attempts are exhausted (spec §4.2 step-up retry rule).
    pub fn record_failed_attempt(&mut self) {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.is_exhausted() {
            self.status = ChallengeStatus::Declined;
        }
    }

    pub fn approve(&mut self) {
        self.status = ChallengeStatus::Approved;
    }

    /// Checks a submitted code against whichever of `plaintext_otp` /
    /// `expected_otp_hash` this challenge was issued with.
    pub fn code_matches(&self, code: &str, hash: impl Fn(&str, &[u8; 16]) -> Vec<u8>) -> bool {
        match &self.plaintext_otp {
            Some(expected) => expected == code,
            None => hash(code, &self.salt) == self.expected_otp_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StepUpChallenge {
        StepUpChallenge {
            id: ChallengeId::generate(),
            session_id: SessionId::generate(),
            method: StepUpMethod::Otp,
            status: ChallengeStatus::Pending,
            plaintext_otp: Some("123456".to_string()),
            expected_otp_hash: Vec::new(),
            salt: [1u8; 16],
            attempts_remaining: 3,
            created_at: OffsetDateTime::from_unix_timestamp(0).unwrap(),
            expires_at: OffsetDateTime::from_unix_timestamp(300).unwrap(),
        }
    }

    #[test]
    fn plaintext_code_must_match_exactly() {
        let challenge = sample();
        assert!(challenge.code_matches("123456", |_, _| Vec::new()));
        assert!(!challenge.code_matches("000000", |_, _| Vec::new()));
    }

    #[test]
    fn hashed_code_is_compared_via_the_supplied_hash_fn() {
        let mut challenge = sample();
        challenge.plaintext_otp = None;
        challenge.expected_otp_hash = vec![9u8; 4];
        let hash = |code: &str, _salt: &[u8; 16]| if code == "654321" { vec![9u8; 4] } else { vec![0u8; 4] };
        assert!(challenge.code_matches("654321", hash));
        assert!(!challenge.code_matches("111111", hash));
    }

    #[test]
    fn exhausts_after_declared_attempts() {
        let mut challenge = sample();
        challenge.record_failed_attempt();
        challenge.record_failed_attempt();
        assert_eq!(challenge.status, ChallengeStatus::Pending);
        challenge.record_failed_attempt();
        assert!(challenge.is_exhausted());
        assert_eq!(challenge.status, ChallengeStatus::Declined);
    }

    #[test]
    fn expiry_is_relative_to_now() {
        let challenge = sample();
        assert!(!challenge.is_expired(OffsetDateTime::from_unix_timestamp(100).unwrap()));
        assert!(challenge.is_expired(OffsetDateTime::from_unix_timestamp(300).unwrap()));
    }
}
