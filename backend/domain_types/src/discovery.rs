//! UCP discovery document served at `/.well-known/ucp` (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingRest {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingService {
    pub rest: ShoppingRest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UcpServices {
    #[serde(rename = "dev.ucp.shopping")]
    pub shopping: ShoppingService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UcpBlock {
    pub version: String,
    pub services: UcpServices,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ap2PaymentBlock {
    pub mandates_supported: bool,
    pub otp_verification_supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBlock {
    pub ap2_payment: Ap2PaymentBlock,
}

/// The full document; field names match the wire shape in spec §6
/// verbatim, so this type derives `Serialize`/`Deserialize` directly
/// rather than through an intermediate DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub ucp: UcpBlock,
    pub capabilities: Vec<String>,
    pub payment: PaymentBlock,
    pub merchant: MerchantInfo,
}

pub const CAP_PRODUCT_SEARCH: &str = "dev.ucp.shopping.product_search";
pub const CAP_CHECKOUT: &str = "dev.ucp.shopping.checkout";

impl DiscoveryDocument {
    pub fn new(version: impl Into<String>, rest_endpoint: impl Into<String>, merchant: MerchantInfo) -> Self {
        Self {
            ucp: UcpBlock {
                version: version.into(),
                services: UcpServices {
                    shopping: ShoppingService {
                        rest: ShoppingRest {
                            endpoint: rest_endpoint.into(),
                        },
                    },
                },
            },
            capabilities: vec![CAP_PRODUCT_SEARCH.to_string(), CAP_CHECKOUT.to_string()],
            payment: PaymentBlock {
                ap2_payment: Ap2PaymentBlock {
                    mandates_supported: true,
                    otp_verification_supported: true,
                },
            },
            merchant,
        }
    }
}
