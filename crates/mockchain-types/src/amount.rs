//! Transfer amounts.
//!
//! A transfer always moves a crypto amount. When the user asked for a fiat
//! value, the amount also carries the fiat figure the crypto was quoted
//! from, so settlement can re-price it.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants;

/// What a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    /// Denominated directly in crypto units.
    Crypto(Decimal),
    /// Crypto amount obtained by quoting `fiat` through the price oracle.
    CryptoWithFiatQuote { crypto: Decimal, fiat: Decimal },
}

impl Amount {
    /// The crypto units that actually move.
    #[must_use]
    pub fn crypto(&self) -> Decimal {
        match self {
            Self::Crypto(crypto) | Self::CryptoWithFiatQuote { crypto, .. } => *crypto,
        }
    }

    /// The fiat figure, for fiat-denominated transfers.
    #[must_use]
    pub fn fiat(&self) -> Option<Decimal> {
        match self {
            Self::Crypto(_) => None,
            Self::CryptoWithFiatQuote { fiat, .. } => Some(*fiat),
        }
    }

    /// The amount as the approval message renders it: crypto at six
    /// places, fiat at two. Only amounts in this form are ever signed.
    #[must_use]
    pub fn at_signed_precision(&self) -> Self {
        match self {
            Self::Crypto(crypto) => Self::Crypto(round_crypto(*crypto)),
            Self::CryptoWithFiatQuote { crypto, fiat } => Self::CryptoWithFiatQuote {
                crypto: round_crypto(*crypto),
                fiat: round_fiat(*fiat),
            },
        }
    }

    /// Human-readable form, e.g. `1.500000 ETH ($100.00 USD)`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Crypto(crypto) => format!("{} ETH", format_crypto(*crypto)),
            Self::CryptoWithFiatQuote { crypto, fiat } => {
                format!("{} ETH (${} USD)", format_crypto(*crypto), format_fiat(*fiat))
            }
        }
    }
}

/// Round half away from zero to six places.
#[must_use]
pub fn round_crypto(value: Decimal) -> Decimal {
    round_fixed(value, constants::CRYPTO_DISPLAY_DECIMALS)
}

/// Round half away from zero to two places.
#[must_use]
pub fn round_fiat(value: Decimal) -> Decimal {
    round_fixed(value, constants::FIAT_DISPLAY_DECIMALS)
}

/// Crypto amount rendered with exactly six decimal places.
#[must_use]
pub fn format_crypto(value: Decimal) -> String {
    round_crypto(value).to_string()
}

/// Fiat amount rendered with exactly two decimal places.
#[must_use]
pub fn format_fiat(value: Decimal) -> String {
    round_fiat(value).to_string()
}

fn round_fixed(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    rounded
}
