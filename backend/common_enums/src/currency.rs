/// ISO-4217 currency codes accepted by the checkout session manager.
///
/// Only the subset used by the seed scenarios is enumerated; an unknown
/// incoming code is rejected as `INVALID_INPUT` rather than silently
/// defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Sgd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Sgd => "SGD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "SGD" => Ok(Self::Sgd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown currency code `{0}`")]
pub struct UnknownCurrency(pub String);

/// Card networks recognized by the merchant agent's mandate-integrity check
/// (spec §4.2 step 2: `card_network` must be in a known set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Discover,
}
