//! Ledger account records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Address;

/// One custodial account, keyed by its address.
///
/// `balance` is never negative and only the settlement engine changes it
/// after the account is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerAccount {
    pub address: Address,
    /// Salted hash derived from the account's seed phrase.
    pub credential_hash: String,
    pub email: Option<String>,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl LedgerAccount {
    /// Public projection without the credential hash.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            address: self.address,
            email: self.email.clone(),
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// What callers outside the ledger may see of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub address: Address,
    pub email: Option<String>,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}
