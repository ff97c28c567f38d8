//! # mockchain-types
//!
//! Shared types, errors, and configuration for the **Mockchain** wallet.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`Nonce`], [`EntryId`]
//! - **Amounts**: [`Amount`] (crypto, or crypto with the fiat quote it came from)
//! - **Ledger model**: [`LedgerAccount`], [`LedgerEntry`], [`EntryStatus`]
//! - **Approval model**: [`PendingApproval`], [`ApprovalState`], [`ApprovalTicket`]
//! - **Time**: [`Clock`], [`SystemClock`]
//! - **Configuration**: [`WalletConfig`] and its sections
//! - **Errors**: [`WalletError`] with `MW_ERR_` prefix codes
//! - **Constants**: fixed-point scales and defaults

pub mod account;
pub mod amount;
pub mod approval;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;

// Re-export all primary types at crate root for ergonomic imports:
//   use mockchain_types::{Address, Amount, PendingApproval, WalletError, ...};

pub use account::*;
pub use amount::*;
pub use approval::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;

// Constants are accessed via `mockchain_types::constants::FOO`
// (not re-exported to avoid name collisions).
