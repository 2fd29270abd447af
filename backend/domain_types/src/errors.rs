//! Spec §7 error taxonomy, carried end-to-end as `{error_kind, message}`.

pub use common_enums::ErrorKind;

/// A terminal, user-facing error. Every fallible UCP/AP2 operation returns
/// this (or a richer domain value wrapping it) rather than an opaque
/// `anyhow`-style error — the wire contract in spec §6/§7 is part of the
/// protocol, not an implementation detail.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

pub type DomainResult<T> = Result<T, ApiError>;
