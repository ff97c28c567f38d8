//! # mockchain-settlement
//!
//! **Finality**: the only place balances change.
//!
//! ## Architecture
//!
//! The [`TransferCoordinator`] drives one transfer from request to commit:
//! 1. Quote fiat amounts and mint a signed-message approval
//! 2. Verify the sender's signature over the exact approval text
//! 3. Re-quote fiat amounts and re-check price tolerance
//! 4. Hand the transfer to the [`SettlementEngine`], which debits, credits
//!    and appends one ledger entry atomically
//! 5. Consume the approval under the same lock, then notify
//!
//! Supply conservation is tracked from account openings and can be
//! verified at any time.

pub mod coordinator;
pub mod engine;
pub mod notify;
pub mod store;
pub mod supply_conservation;

pub use coordinator::{RequestedAmount, TransferCoordinator};
pub use engine::{CommitGuard, SettlementEngine, TransferOutcome, random_opening_balance};
pub use notify::{LogNotifier, Notifier, TransferNotice};
pub use store::{AccountInsert, LedgerStore, MemoryLedgerStore, TransferCommit};
pub use supply_conservation::SupplyConservation;
