//! Network Tokenization Adapter (spec §4.5, §9): modeled as a capability
//! behind a trait with two implementations — a no-op pass-through used
//! when the feature is disabled, and an OAuth1-signed HTTP client against
//! the external network. The core commit path must never branch on
//! whether tokenization is enabled; it only ever talks to this trait.

use async_trait::async_trait;
use domain_types::errors::DomainResult;
use masking::Secret;

#[derive(Debug, Clone)]
pub struct TokenizeRequest {
    pub pan: Secret<String>,
    pub expiry: String,
    pub network: common_enums::CardNetwork,
}

#[derive(Debug, Clone)]
pub struct TokenizeResult {
    pub network_token: String,
    pub token_reference: String,
    pub assurance_level: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateRequest {
    pub token: String,
    pub amount: rust_decimal::Decimal,
    pub currency: common_enums::Currency,
    pub merchant_id: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone)]
pub enum AuthenticateOutcome {
    NotRequired,
    Required { challenge_descriptor: String },
}

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub token: String,
    pub transaction_id: String,
    pub code: String,
}

/// Whether tokenization is wired to the real network or to the no-op
/// pass-through (spec §9 capability-flag design).
#[async_trait]
pub trait TokenizationAdapter: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn tokenize(&self, request: TokenizeRequest) -> DomainResult<Option<TokenizeResult>>;

    async fn authenticate(&self, request: AuthenticateRequest) -> DomainResult<AuthenticateOutcome>;

    async fn verify(&self, request: VerifyRequest) -> DomainResult<bool>;
}
