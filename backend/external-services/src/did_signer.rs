//! Client for the merchant's DID/VC signing microservice (spec §1, §4.2
//! step 5). Out of scope as a component to build; this crate only needs
//! to speak to it. A `None` endpoint degrades to unsigned receipts.

use async_trait::async_trait;
use domain_types::errors::DomainResult;
use interfaces::signer::ReceiptSigner;
use serde::Deserialize;
use serde_json::json;

use crate::http_client;

pub struct HttpDidSigner {
    pub endpoint: Option<String>,
    pub call_timeout_secs: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    signature_b64: String,
}

#[async_trait]
impl ReceiptSigner for HttpDidSigner {
    async fn sign_receipt(&self, canonical_receipt: &[u8]) -> DomainResult<Option<Vec<u8>>> {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Ok(None);
        };
        let body = json!({ "payload_b64": common_utils::b64::encode(canonical_receipt) });

        match http_client::post_json_signed(endpoint, "", &body, self.call_timeout_secs).await {
            Ok(SignResponse { signature_b64 }) => {
                let signature = common_utils::b64::decode(&signature_b64).map_err(|_| {
                    domain_types::errors::ApiError::internal("signer returned malformed signature")
                })?;
                Ok(Some(signature))
            }
            Err(err) => {
                tracing::warn!(error = %err, "receipt signer unavailable, issuing receipt unsigned");
                Ok(None)
            }
        }
    }
}
