//! Append-only ledger entries.
//!
//! Every committed transfer produces exactly one [`LedgerEntry`]. Entries
//! are never edited; the entry and the two balance updates it reflects are
//! written as one unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, EntryId};

/// Outcome recorded on a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Balances moved. Rejected transfers write no entry at all.
    Success,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
        }
    }
}

/// One committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub from: Address,
    pub to: Address,
    pub amount_crypto: Decimal,
    pub amount_fiat: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub status: EntryStatus,
}

impl LedgerEntry {
    /// The amount as the tagged variant it was settled with.
    #[must_use]
    pub fn amount(&self) -> Amount {
        match self.amount_fiat {
            Some(fiat) => Amount::CryptoWithFiatQuote {
                crypto: self.amount_crypto,
                fiat,
            },
            None => Amount::Crypto(self.amount_crypto),
        }
    }

    /// Whether `address` is either party of this entry.
    #[must_use]
    pub fn involves(&self, address: &Address) -> bool {
        self.from == *address || self.to == *address
    }
}
