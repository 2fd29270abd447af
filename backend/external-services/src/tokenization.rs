//! The two `TokenizationAdapter` implementations: a no-op pass-through
//! used when the feature flag is off, and the real OAuth1-signed HTTP
//! client against the external network (spec §4.5, §9).

use async_trait::async_trait;
use domain_types::errors::DomainResult;
use interfaces::tokenization::{
    AuthenticateOutcome, AuthenticateRequest, TokenizationAdapter, TokenizeRequest, TokenizeResult, VerifyRequest,
};
use masking::ExposeInterface;
use serde_json::json;

use crate::{http_client, oauth1::Oauth1Signer};

/// Used when the tokenization-enabled flag is off. The core commit path
/// never special-cases this — `tokenize` always returns `Ok(None)`,
/// `authenticate` always reports `NotRequired`.
pub struct NoopAdapter;

#[async_trait]
impl TokenizationAdapter for NoopAdapter {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn tokenize(&self, _request: TokenizeRequest) -> DomainResult<Option<TokenizeResult>> {
        Ok(None)
    }

    async fn authenticate(&self, _request: AuthenticateRequest) -> DomainResult<AuthenticateOutcome> {
        Ok(AuthenticateOutcome::NotRequired)
    }

    async fn verify(&self, _request: VerifyRequest) -> DomainResult<bool> {
        Ok(true)
    }
}

pub struct Oauth1Adapter {
    pub tokenize_url: String,
    pub authenticate_url: String,
    pub verify_url: String,
    pub call_timeout_secs: u64,
    signer: Oauth1Signer,
}

impl Oauth1Adapter {
    pub fn new(
        tokenize_url: impl Into<String>,
        authenticate_url: impl Into<String>,
        verify_url: impl Into<String>,
        call_timeout_secs: u64,
        signer: Oauth1Signer,
    ) -> Self {
        Self {
            tokenize_url: tokenize_url.into(),
            authenticate_url: authenticate_url.into(),
            verify_url: verify_url.into(),
            call_timeout_secs,
            signer,
        }
    }

    async fn signed_post<T: serde::de::DeserializeOwned>(&self, url: &str, body: serde_json::Value) -> DomainResult<T> {
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        let authorization = self.signer.sign("POST", url, &bytes)?;
        http_client::post_json_signed(url, &authorization, &body, self.call_timeout_secs).await
    }
}

#[derive(serde::Deserialize)]
struct TokenizeWireResponse {
    network_token: String,
    token_reference: String,
    assurance_level: String,
}

#[derive(serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AuthenticateWireResponse {
    NotRequired,
    Required { challenge_descriptor: String },
}

#[derive(serde::Deserialize)]
struct VerifyWireResponse {
    approved: bool,
}

#[async_trait]
impl TokenizationAdapter for Oauth1Adapter {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn tokenize(&self, request: TokenizeRequest) -> DomainResult<Option<TokenizeResult>> {
        let body = json!({
            "pan": request.pan.expose(),
            "expiry": request.expiry,
            "network": request.network,
        });
        let response: TokenizeWireResponse = self.signed_post(&self.tokenize_url, body).await?;
        Ok(Some(TokenizeResult {
            network_token: response.network_token,
            token_reference: response.token_reference,
            assurance_level: response.assurance_level,
        }))
    }

    async fn authenticate(&self, request: AuthenticateRequest) -> DomainResult<AuthenticateOutcome> {
        let body = json!({
            "token": request.token,
            "amount": request.amount,
            "currency": request.currency,
            "merchant_id": request.merchant_id,
            "transaction_id": request.transaction_id,
        });
        let response: AuthenticateWireResponse = self.signed_post(&self.authenticate_url, body).await?;
        Ok(match response {
            AuthenticateWireResponse::NotRequired => AuthenticateOutcome::NotRequired,
            AuthenticateWireResponse::Required { challenge_descriptor } => {
                AuthenticateOutcome::Required { challenge_descriptor }
            }
        })
    }

    async fn verify(&self, request: VerifyRequest) -> DomainResult<bool> {
        let body = json!({
            "token": request.token,
            "transaction_id": request.transaction_id,
            "code": request.code,
        });
        let response: VerifyWireResponse = self.signed_post(&self.verify_url, body).await?;
        Ok(response.approved)
    }
}
