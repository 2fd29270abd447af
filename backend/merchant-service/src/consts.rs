#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Development,
    Release,
}

impl Env {
    pub const fn current_env() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Release
        }
    }

    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Release => "production.toml",
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Header key for request ID, propagated through the Request-Log
/// Recorder's span (spec §4.6).
pub const X_REQUEST_ID: &str = "x-request-id";

/// Upper bound on the request body bytes the Request-Log Recorder buffers
/// per call before re-streaming them to the handler (spec §4.6).
pub const REQUEST_LOG_BODY_LIMIT: usize = 64 * 1024;
