//! Checkout Session Manager (spec §4.1) — Create/Get/Update and the
//! state-machine enforcement shared by every transition. Complete's
//! signature/risk/step-up workflow lives in [`crate::ap2_agent`]; this
//! module owns the session store and the transitions around it.

use std::sync::Arc;

use common_enums::SessionStatus;
use domain_types::{
    api::{CreateSessionRequest, UpdateSessionRequest},
    checkout_session::{CheckoutSession, LineItem, NoTax, TaxPolicy},
    errors::{ApiError, DomainResult},
    ids::SessionId,
    mandate::PaymentMandate,
};
use interfaces::{catalog::CatalogProvider, session_store::SessionStore};

pub struct CheckoutSessionManager {
    store: Arc<dyn SessionStore>,
    catalog: Option<Arc<dyn CatalogProvider>>,
    tax_policy: Arc<dyn TaxPolicy>,
}

impl CheckoutSessionManager {
    pub fn new(store: Arc<dyn SessionStore>, catalog: Option<Arc<dyn CatalogProvider>>) -> Self {
        Self {
            store,
            catalog,
            tax_policy: Arc::new(NoTax),
        }
    }

    pub async fn create(&self, request: CreateSessionRequest) -> DomainResult<CheckoutSession> {
        if request.line_items.is_empty() {
            return Err(ApiError::invalid_input("a checkout session requires at least one line item"));
        }
        let mut line_items = Vec::with_capacity(request.line_items.len());
        for item in request.line_items {
            if item.quantity == 0 {
                return Err(ApiError::invalid_input(format!("line item {} has zero quantity", item.sku)));
            }
            if item.unit_price.is_sign_negative() {
                return Err(ApiError::invalid_input(format!(
                    "line item {} has a negative unit price",
                    item.sku
                )));
            }
            if let Some(catalog) = &self.catalog {
                if !catalog.sku_exists(&item.sku).await? {
                    return Err(ApiError::invalid_input(format!("unknown sku {}", item.sku)));
                }
            }
            line_items.push(LineItem {
                sku: item.sku,
                name: item.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
            });
        }

        let now = common_utils::date_time::now();
        let session = CheckoutSession::create(
            line_items,
            request.buyer_email,
            request.currency,
            self.tax_policy.as_ref(),
            now,
        );
        let versioned = self.store.create(session).await?;
        Ok(versioned.session)
    }

    pub async fn get(&self, id: &SessionId) -> DomainResult<CheckoutSession> {
        Ok(self.store.get(id).await?.session)
    }

    /// Attaches a mandate to a session (spec §4.1 Update). Retries the
    /// compare-and-set on a version conflict — concurrent writers to the
    /// same session race at the store, not here.
    pub async fn update(&self, id: &SessionId, request: UpdateSessionRequest) -> DomainResult<CheckoutSession> {
        let incoming = request
            .mandate
            .into_domain()
            .map_err(|err| ApiError::invalid_input(format!("malformed mandate: {err}")))?;

        loop {
            let versioned = self.store.get(id).await?;
            let mut session = versioned.session;

            if let Some(existing) = session.mandate.as_ref() {
                if existing.is_identical_to(&incoming) {
                    return Ok(session);
                }
            }
            if !matches!(
                session.status,
                SessionStatus::Incomplete | SessionStatus::ReadyForComplete | SessionStatus::RequiresEscalation
            ) {
                return Err(ApiError::invalid_state(format!(
                    "session {id} cannot accept an Update while {}",
                    session.status
                )));
            }

            if let Some(owner) = self
                .store
                .find_session_by_mandate_id(incoming.contents.payment_mandate_id.as_str())
                .await?
            {
                if &owner != id {
                    return Err(ApiError::new(
                        common_enums::ErrorKind::MandateReuse,
                        "mandate id is already attached to another session",
                    ));
                }
            }

            self.validate_mandate_against_session(&session, &incoming)?;

            session.mandate = Some(incoming.clone());
            session.user_authorization = Some(incoming.user_authorization.clone());
            session.active_challenge = None;
            session.status = SessionStatus::ReadyForComplete;
            session.updated_at = common_utils::date_time::now();

            match self.store.compare_and_set(id, versioned.version, session).await {
                Ok(updated) => return Ok(updated.session),
                Err(err) if err.kind == common_enums::ErrorKind::InvalidState => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Transitions sessions past their inactivity deadline to `Failed`
    /// (spec §5). Best-effort: a session that moved on under us before
    /// the compare-and-set lands is left alone rather than retried.
    pub async fn expire_inactive_sessions(&self, now: time::OffsetDateTime) -> DomainResult<Vec<SessionId>> {
        let candidates = self.store.list_expired(now).await?;
        let mut expired = Vec::new();
        for id in candidates {
            let versioned = match self.store.get(&id).await {
                Ok(versioned) => versioned,
                Err(_) => continue,
            };
            let mut session = versioned.session;
            if !matches!(
                session.status,
                SessionStatus::ReadyForComplete | SessionStatus::RequiresEscalation
            ) {
                continue;
            }
            session.status = SessionStatus::Failed;
            session.failure_reason = Some(common_enums::ErrorKind::SessionExpired);
            session.updated_at = now;
            if self.store.compare_and_set(&id, versioned.version, session).await.is_ok() {
                expired.push(id);
            }
        }
        Ok(expired)
    }

    fn validate_mandate_against_session(
        &self,
        session: &CheckoutSession,
        mandate: &PaymentMandate,
    ) -> DomainResult<()> {
        let declared = domain_types::money::Money::new(
            mandate.contents.payment_details_total.amount.currency,
            mandate.contents.payment_details_total.amount.value,
        );
        if !declared.approx_eq(&session.total_money()) {
            return Err(ApiError::new(
                common_enums::ErrorKind::MandateSessionMismatch,
                format!(
                    "mandate total {} {} does not match session total {} {}",
                    declared.currency,
                    declared.value,
                    session.currency,
                    session.total
                ),
            ));
        }
        if mandate.contents.payment_response.payer_email.as_str() != session.buyer_email.as_str() {
            return Err(ApiError::new(
                common_enums::ErrorKind::MandateSessionMismatch,
                "mandate payer_email does not match session buyer_email",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::InMemorySessionStore;
    use common_utils::pii::Email;

    fn manager() -> CheckoutSessionManager {
        CheckoutSessionManager::new(Arc::new(InMemorySessionStore::new()), None)
    }

    fn sample_request() -> CreateSessionRequest {
        CreateSessionRequest {
            line_items: vec![domain_types::api::LineItemRequest {
                sku: "PROD-001".into(),
                name: "Widget".into(),
                unit_price: rust_decimal::Decimal::new(499, 2),
                quantity: 2,
            }],
            buyer_email: Email::try_from("a@example.com".to_string()).unwrap(),
            currency: common_enums::Currency::Sgd,
        }
    }

    #[tokio::test]
    async fn create_rejects_empty_cart() {
        let manager = manager();
        let mut request = sample_request();
        request.line_items.clear();
        let err = manager.create(request).await.unwrap_err();
        assert_eq!(err.kind, common_enums::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn create_computes_totals() {
        let manager = manager();
        let session = manager.create(sample_request()).await.unwrap();
        assert_eq!(session.total, rust_decimal::Decimal::new(998, 2));
        assert_eq!(session.status, SessionStatus::Incomplete);
    }

    #[tokio::test]
    async fn get_unknown_session_is_not_found() {
        let manager = manager();
        let err = manager.get(&SessionId::generate()).await.unwrap_err();
        assert_eq!(err.kind, common_enums::ErrorKind::NotFound);
    }
}
