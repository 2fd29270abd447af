//! Consolidated constants shared by both services.

/// Length (in characters, excluding prefix) of a generated opaque id.
pub const ID_LENGTH: usize = 20;

/// Alphabet used for nanoid generation — avoids visually ambiguous characters.
pub(crate) const ALPHABETS: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// Header carrying the caller-supplied or recorder-assigned request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Sentinel used in logs/responses in place of a masked value.
pub const REDACTED: &str = "REDACTED";

/// Window (seconds) a `ready_for_complete`/`requires_escalation` session may
/// sit idle before the merchant's sweep expires it (spec §5).
pub const SESSION_INACTIVITY_TIMEOUT_SECS: i64 = 5 * 60;

/// Step-up challenge lifetime (spec §3/§5).
pub const CHALLENGE_TTL_SECS: i64 = 5 * 60;

/// Maximum OTP submission attempts before a challenge is exhausted (spec §3).
pub const CHALLENGE_MAX_ATTEMPTS: u8 = 3;

/// Fixed step-up code issued in demo mode (spec §8's seed scenario uses this
/// exact value). Outside demo mode a random code is generated and only its
/// salted hash is retained.
pub const DEMO_OTP_CODE: &str = "123456";

/// Default outbound call deadline for S→M and S→network calls (spec §5).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
