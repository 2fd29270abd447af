//! Outbound HTTP client shared by every external collaborator this
//! service talks to (tokenization network, DID signer). A single
//! connection-pooled `reqwest::Client` is built once and reused, mirroring
//! the base-client singleton pattern used for connector calls.

use domain_types::errors::{ApiError, DomainResult};
use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn shared_client(call_timeout_secs: u64) -> DomainResult<Client> {
    CLIENT
        .get_or_try_init(|| {
            Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(Duration::from_secs(call_timeout_secs))
                .build()
        })
        .map(Clone::clone)
        .map_err(|err| {
            tracing::error!(error = %err, "failed to construct outbound http client");
            ApiError::new(
                common_enums::ErrorKind::UpstreamUnavailable,
                "could not construct outbound http client",
            )
        })
}

/// POSTs `body` to `url` with a pre-signed `Authorization` header,
/// returning the parsed JSON body. Transport and non-2xx failures both
/// surface as `UPSTREAM_UNAVAILABLE`; callers on the tokenization path
/// are expected to catch this and degrade gracefully (spec §4.5, §7).
pub async fn post_json_signed<T: serde::de::DeserializeOwned>(
    url: &str,
    authorization: &str,
    body: &serde_json::Value,
    call_timeout_secs: u64,
) -> DomainResult<T> {
    let client = shared_client(call_timeout_secs)?;
    let response = client
        .post(url)
        .header("Authorization", authorization)
        .json(body)
        .send()
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, url, "outbound call failed");
            ApiError::new(common_enums::ErrorKind::UpstreamUnavailable, err.to_string())
        })?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(ApiError::new(
            common_enums::ErrorKind::UpstreamUnavailable,
            format!("upstream returned {status}"),
        ));
    }

    response.json::<T>().await.map_err(|err| {
        ApiError::new(
            common_enums::ErrorKind::UpstreamUnavailable,
            format!("failed to decode upstream response: {err}"),
        )
    })
}
