//! Shared application state (spec §9: "explicit state owned by the
//! Checkout Session Manager component, passed by reference — no
//! process-wide mutable singletons").

use std::sync::Arc;

use interfaces::{
    catalog::CatalogProvider, challenge_store::ChallengeStore, device_registry::DeviceRegistry, signer::ReceiptSigner,
};

use crate::{ap2_agent::Ap2MerchantAgent, checkout::CheckoutSessionManager, configs::Config, request_log::RequestLogRecorder};

pub struct AppState {
    pub config: Config,
    pub checkout: CheckoutSessionManager,
    pub ap2_agent: Ap2MerchantAgent,
    pub catalog: Arc<dyn CatalogProvider>,
    pub devices: Arc<dyn DeviceRegistry>,
    pub challenges: Arc<dyn ChallengeStore>,
    pub signer: Arc<dyn ReceiptSigner>,
    pub request_log: Arc<RequestLogRecorder>,
}
