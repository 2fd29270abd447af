//! HTTP client the Discovery Consumer and Checkout Orchestrator use to talk
//! to the merchant's UCP/AP2 surface (spec §4.1, §4.3). Discovery is fetched
//! once and cached for the process lifetime, matching the Discovery
//! Consumer's "caches M's capabilities" responsibility (spec §1).

use common_utils::pii::Email;
use domain_types::{
    api::{CompleteSessionResponse, CreateSessionRequest, PaymentMandateWire, SessionView, UpdateSessionRequest},
    discovery::DiscoveryDocument,
    errors::{ApiError, DomainResult},
    ids::SessionId,
};
use external_services::http_client;
use tokio::sync::OnceCell;

pub struct MerchantClient {
    discovery_url: String,
    call_timeout_secs: u64,
    discovery: OnceCell<DiscoveryDocument>,
}

impl MerchantClient {
    pub fn new(discovery_url: impl Into<String>, call_timeout_secs: u64) -> Self {
        Self {
            discovery_url: discovery_url.into(),
            call_timeout_secs,
            discovery: OnceCell::new(),
        }
    }

    pub async fn discovery(&self) -> DomainResult<&DiscoveryDocument> {
        self.discovery
            .get_or_try_init(|| async {
                let client = http_client::shared_client(self.call_timeout_secs)?;
                let response = client.get(&self.discovery_url).send().await.map_err(|err| {
                    ApiError::new(common_enums::ErrorKind::UpstreamUnavailable, format!("discovery call failed: {err}"))
                })?;
                response.json::<DiscoveryDocument>().await.map_err(|err| {
                    ApiError::new(
                        common_enums::ErrorKind::UpstreamUnavailable,
                        format!("discovery response could not be parsed: {err}"),
                    )
                })
            })
            .await
    }

    async fn rest_endpoint(&self) -> DomainResult<String> {
        Ok(self.discovery().await?.ucp.services.shopping.rest.endpoint.clone())
    }

    pub async fn create_session(&self, request: CreateSessionRequest) -> DomainResult<SessionView> {
        let endpoint = self.rest_endpoint().await?;
        let url = format!("{endpoint}/checkout-sessions");
        let client = http_client::shared_client(self.call_timeout_secs)?;
        let response = client.post(&url).json(&request).send().await.map_err(transport_error)?;
        parse_response(response).await
    }

    pub async fn get_session(&self, id: &SessionId) -> DomainResult<SessionView> {
        let endpoint = self.rest_endpoint().await?;
        let url = format!("{endpoint}/checkout-sessions/{id}");
        let client = http_client::shared_client(self.call_timeout_secs)?;
        let response = client.get(&url).send().await.map_err(transport_error)?;
        parse_response(response).await
    }

    pub async fn update_session(&self, id: &SessionId, mandate: PaymentMandateWire) -> DomainResult<SessionView> {
        let endpoint = self.rest_endpoint().await?;
        let url = format!("{endpoint}/checkout-sessions/{id}");
        let request = UpdateSessionRequest { mandate };
        let client = http_client::shared_client(self.call_timeout_secs)?;
        let response = client.put(&url).json(&request).send().await.map_err(transport_error)?;
        parse_response(response).await
    }

    pub async fn complete_session(&self, id: &SessionId, otp_code: Option<String>) -> DomainResult<CompleteSessionResponse> {
        let endpoint = self.rest_endpoint().await?;
        let url = format!("{endpoint}/checkout-sessions/{id}/complete");
        let client = http_client::shared_client(self.call_timeout_secs)?;
        let mut request = client.post(&url);
        if let Some(code) = otp_code {
            request = request.query(&[("otp_code", code)]);
        }
        let response = request.send().await.map_err(transport_error)?;
        parse_response(response).await
    }

    pub async fn register_device_credential(&self, email: &Email, public_key: [u8; 32]) -> DomainResult<()> {
        let merchant_root = {
            let endpoint = self.rest_endpoint().await?;
            endpoint
                .trim_end_matches("/ucp/v1")
                .trim_end_matches('/')
                .to_string()
        };
        let url = format!("{merchant_root}/ucp/v1/device-credentials");
        let body = serde_json::json!({
            "email": email,
            "public_key": common_utils::b64::encode(public_key),
        });
        let client = http_client::shared_client(self.call_timeout_secs)?;
        let response = client.post(&url).json(&body).send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(ApiError::new(
                common_enums::ErrorKind::UpstreamUnavailable,
                format!("device credential registration returned {}", response.status()),
            ));
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::new(common_enums::ErrorKind::UpstreamUnavailable, format!("call to merchant failed: {err}"))
}

async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> DomainResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::new(
            merchant_error_kind(status),
            format!("merchant returned {status}: {body}"),
        ));
    }
    response.json::<T>().await.map_err(|err| {
        ApiError::new(
            common_enums::ErrorKind::UpstreamUnavailable,
            format!("failed to decode merchant response: {err}"),
        )
    })
}

fn merchant_error_kind(status: reqwest::StatusCode) -> common_enums::ErrorKind {
    match status.as_u16() {
        400 => common_enums::ErrorKind::InvalidInput,
        404 => common_enums::ErrorKind::NotFound,
        409 => common_enums::ErrorKind::InvalidState,
        401 => common_enums::ErrorKind::InvalidAuthorization,
        422 => common_enums::ErrorKind::MalformedMandate,
        410 => common_enums::ErrorKind::ChallengeExpired,
        _ => common_enums::ErrorKind::UpstreamUnavailable,
    }
}
