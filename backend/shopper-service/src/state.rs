//! Shared application state — explicit, passed by reference, no
//! process-wide mutable singletons (spec §9).

use std::sync::Arc;

use crate::{configs::Config, credentials::CredentialsProvider, orchestrator::CheckoutOrchestrator};

pub struct AppState {
    pub config: Config,
    pub credentials: Arc<CredentialsProvider>,
    pub orchestrator: CheckoutOrchestrator,
}
