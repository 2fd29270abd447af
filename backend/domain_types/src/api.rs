//! Wire DTOs for the UCP checkout and product-search surface (spec §6).
//! Kept separate from the domain model so the canonical mandate encoding
//! and internal session representation never drift silently when the
//! wire shape is adjusted.

use common_enums::{CardNetwork, Currency, ErrorKind, SessionStatus};
use common_utils::pii::Email;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    checkout_session::{CheckoutSession, LineItem},
    ids::SessionId,
    mandate::{
        MandateContents, PaymentDetailsAmount, PaymentDetailsTotal, PaymentMandate, PaymentMethodDetails,
        PaymentResponse,
    },
    receipt::{PaymentReceipt, SettlementStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error_kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub line_items: Vec<LineItemRequest>,
    pub buyer_email: Email,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemView {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl From<&LineItem> for LineItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub line_items: Vec<LineItemView>,
    pub buyer_email: Email,
    pub currency: Currency,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptView>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&CheckoutSession> for SessionView {
    fn from(session: &CheckoutSession) -> Self {
        Self {
            id: session.id.clone(),
            line_items: session.line_items.iter().map(LineItemView::from).collect(),
            buyer_email: session.buyer_email.clone(),
            currency: session.currency,
            subtotal: session.subtotal,
            tax: session.tax,
            total: session.total,
            status: session.status,
            receipt: session.receipt.as_ref().map(ReceiptView::from),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptView {
    pub settlement_status: SettlementStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub network_reference: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl From<&PaymentReceipt> for ReceiptView {
    fn from(receipt: &PaymentReceipt) -> Self {
        Self {
            settlement_status: receipt.settlement_status,
            amount: receipt.settled_amount.value,
            currency: receipt.settled_amount.currency,
            network_reference: receipt.network_reference.clone(),
            issued_at: receipt.issued_at,
            signature: receipt.signature.as_ref().map(common_utils::b64::encode),
        }
    }
}

/// Matches the nested wire shape in spec §6 verbatim (`payment_mandate_contents`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMandateWire {
    pub payment_mandate_contents: MandateContentsWire,
    pub user_authorization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandateContentsWire {
    pub payment_mandate_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub payment_details_id: String,
    pub payment_details_total: PaymentDetailsTotal,
    pub payment_response: PaymentResponseWire,
    pub merchant_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponseWire {
    pub request_id: String,
    pub method_name: String,
    pub details: PaymentMethodDetailsWire,
    pub payer_email: Email,
    pub payer_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodDetailsWire {
    pub token: String,
    pub cryptogram: String,
    pub card_last_four: String,
    pub card_network: CardNetwork,
}

impl PaymentMandateWire {
    /// Decodes the base64 `user_authorization` and parses the mandate id,
    /// producing the internal `PaymentMandate` used by the session manager
    /// and the merchant agent.
    pub fn into_domain(self) -> Result<PaymentMandate, common_utils::errors::ParsingError> {
        let user_authorization = common_utils::b64::decode(&self.user_authorization)?;
        let contents = MandateContents {
            payment_mandate_id: crate::ids::MandateId::from_raw(self.payment_mandate_contents.payment_mandate_id),
            timestamp: self.payment_mandate_contents.timestamp,
            payment_details_id: self.payment_mandate_contents.payment_details_id,
            payment_details_total: self.payment_mandate_contents.payment_details_total,
            payment_response: PaymentResponse {
                request_id: self.payment_mandate_contents.payment_response.request_id,
                method_name: self.payment_mandate_contents.payment_response.method_name,
                details: PaymentMethodDetails {
                    token: self.payment_mandate_contents.payment_response.details.token,
                    cryptogram: self.payment_mandate_contents.payment_response.details.cryptogram,
                    card_last_four: self.payment_mandate_contents.payment_response.details.card_last_four,
                    card_network: self.payment_mandate_contents.payment_response.details.card_network,
                },
                payer_email: self.payment_mandate_contents.payment_response.payer_email,
                payer_name: self.payment_mandate_contents.payment_response.payer_name,
            },
            merchant_agent: self.payment_mandate_contents.merchant_agent,
        };
        Ok(PaymentMandate {
            contents,
            user_authorization,
        })
    }
}

impl From<&PaymentMandate> for PaymentMandateWire {
    fn from(mandate: &PaymentMandate) -> Self {
        let contents = &mandate.contents;
        Self {
            payment_mandate_contents: MandateContentsWire {
                payment_mandate_id: contents.payment_mandate_id.as_str().to_string(),
                timestamp: contents.timestamp,
                payment_details_id: contents.payment_details_id.clone(),
                payment_details_total: PaymentDetailsTotal {
                    label: contents.payment_details_total.label.clone(),
                    amount: PaymentDetailsAmount {
                        currency: contents.payment_details_total.amount.currency,
                        value: contents.payment_details_total.amount.value,
                    },
                },
                payment_response: PaymentResponseWire {
                    request_id: contents.payment_response.request_id.clone(),
                    method_name: contents.payment_response.method_name.clone(),
                    details: PaymentMethodDetailsWire {
                        token: contents.payment_response.details.token.clone(),
                        cryptogram: contents.payment_response.details.cryptogram.clone(),
                        card_last_four: contents.payment_response.details.card_last_four.clone(),
                        card_network: contents.payment_response.details.card_network,
                    },
                    payer_email: contents.payment_response.payer_email.clone(),
                    payer_name: contents.payment_response.payer_name.clone(),
                },
                merchant_agent: contents.merchant_agent.clone(),
            },
            user_authorization: common_utils::b64::encode(&mandate.user_authorization),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(flatten)]
    pub mandate: PaymentMandateWire,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompleteSessionQuery {
    pub otp_code: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OtpChallengeEnvelope {
    pub payment_mandate_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodDetailsOut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_challenge: Option<OtpChallengeEnvelope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSessionResponse {
    pub session: SessionView,
    pub payment_status: PaymentStatus,
    pub payment_method_details: PaymentMethodDetailsOut,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSearchItem {
    pub id: String,
    pub title: String,
    /// Minor currency units (cents) — the one place the wire protocol
    /// mandates an integer amount instead of `Money` (spec §6).
    pub price: i64,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSearchResponse {
    pub items: Vec<ProductSearchItem>,
    pub total: u32,
}
