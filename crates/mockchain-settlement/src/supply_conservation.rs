//! Supply conservation invariant checker.
//!
//! ```text
//! Σ(balances) == Σ(opening balances)
//! ```
//!
//! Transfers carry no fees, so only account openings change the total. If
//! this ever breaks, value was minted or destroyed by a bug.

use mockchain_types::{Result, WalletError};
use rust_decimal::Decimal;

/// Running total of every opening balance credited since genesis.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    openings: Decimal,
    accounts: u64,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the opening balance of a newly created account.
    pub fn record_opening(&mut self, amount: Decimal) {
        self.openings += amount;
        self.accounts += 1;
    }

    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.openings
    }

    /// Number of openings recorded.
    #[must_use]
    pub fn accounts(&self) -> u64 {
        self.accounts
    }

    /// Verify that `actual_supply` (the sum of all balances) matches.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        if actual_supply != self.openings {
            return Err(WalletError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {} ({} openings)",
                    self.openings, self.accounts
                ),
            });
        }
        Ok(())
    }
}
