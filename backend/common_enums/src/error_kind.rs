/// The `error_kind` taxonomy from spec §7, surfaced verbatim on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidState,
    MandateSessionMismatch,
    InvalidAuthorization,
    MalformedMandate,
    ChallengeExpired,
    ChallengeExhausted,
    InvalidOtp,
    SessionExpired,
    MandateReuse,
    UpstreamUnavailable,
    Internal,
}

impl ErrorKind {
    /// HTTP status mapping per spec §7.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput
            | Self::MandateSessionMismatch
            | Self::InvalidOtp
            | Self::MandateReuse => 400,
            Self::NotFound => 404,
            Self::InvalidState | Self::SessionExpired => 409,
            Self::InvalidAuthorization => 401,
            Self::MalformedMandate => 422,
            Self::ChallengeExpired | Self::ChallengeExhausted => 410,
            Self::UpstreamUnavailable => 502,
            Self::Internal => 500,
        }
    }
}
