/// `CheckoutSession.status` — spec §3/§4.1 state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Incomplete,
    ReadyForComplete,
    RequiresEscalation,
    Complete,
    Failed,
}

impl SessionStatus {
    /// Terminal states accept no further transitions (spec §4.1).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// `StepUpChallenge.method` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepUpMethod {
    Otp,
    Biometric,
    None,
}

/// `StepUpChallenge.status` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Pending,
    Approved,
    Declined,
    Expired,
}
