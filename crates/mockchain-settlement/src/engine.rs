//! Settlement engine (local atomic transfers).
//!
//! A transfer runs entirely under the per-address locks of both parties:
//! 1. Reject non-positive amounts and self-transfers
//! 2. Load the sender and check its balance
//! 3. Load the recipient (never created implicitly)
//! 4. Compute both new balances and guard against a negative result
//! 5. Run the caller's [`CommitGuard::precheck`]
//! 6. Commit both balances plus one ledger entry in a single store call
//! 7. Run [`CommitGuard::committed`] before the locks are released
//!
//! Any failure before step 6 leaves the ledger untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockchain_types::{
    AccountSummary, Address, Amount, Clock, LedgerAccount, LedgerConfig, LedgerEntry, Result,
    WalletError, constants::OPENING_BALANCE_DECIMALS,
};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, info};

use crate::store::{AccountInsert, LedgerStore, TransferCommit};
use crate::supply_conservation::SupplyConservation;

/// Hooks run inside the settlement critical section.
pub trait CommitGuard {
    /// Last check before the commit. An error aborts the transfer.
    fn precheck(&self) -> Result<()>;

    /// Called once after the commit, while both accounts are still locked.
    fn committed(&self, entry: &LedgerEntry);
}

impl CommitGuard for () {
    fn precheck(&self) -> Result<()> {
        Ok(())
    }

    fn committed(&self, _entry: &LedgerEntry) {}
}

/// What a successful transfer produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub entry: LedgerEntry,
    pub sender_balance: Decimal,
    pub recipient_balance: Decimal,
}

/// Uniform opening balance in `[min, max]` at four decimal places.
pub fn random_opening_balance(config: &LedgerConfig) -> Result<Decimal> {
    let scale = Decimal::from(10u64.pow(OPENING_BALANCE_DECIMALS));
    let to_units = |value: Decimal| {
        value
            .checked_mul(scale)
            .and_then(|v| v.round().to_i64())
            .ok_or_else(|| WalletError::Configuration(format!("opening balance {value} out of range")))
    };
    let min = to_units(config.opening_balance_min)?;
    let max = to_units(config.opening_balance_max)?;
    if min > max {
        return Err(WalletError::Configuration(format!(
            "opening balance range [{}, {}] is empty",
            config.opening_balance_min, config.opening_balance_max
        )));
    }
    let units = rand::thread_rng().gen_range(min..=max);
    Ok(Decimal::new(units, OPENING_BALANCE_DECIMALS))
}

/// Owns every balance mutation.
pub struct SettlementEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    /// One lock slot per address that ever took part in a transfer.
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
    supply: Mutex<SupplyConservation>,
}

impl SettlementEngine {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: Mutex::new(HashMap::new()),
            supply: Mutex::new(SupplyConservation::new()),
        }
    }

    fn slot(&self, address: Address) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(address).or_default())
    }

    fn supply(&self) -> MutexGuard<'_, SupplyConservation> {
        self.supply.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Open an account with `opening_balance`, or return the existing one
    /// untouched.
    pub fn open_account(
        &self,
        address: Address,
        credential_hash: String,
        email: Option<String>,
        opening_balance: Decimal,
    ) -> Result<AccountSummary> {
        if opening_balance.is_sign_negative() {
            return Err(WalletError::InvalidAmount(opening_balance));
        }

        let account = LedgerAccount {
            address,
            credential_hash,
            email,
            balance: opening_balance,
            created_at: self.clock.now_utc(),
        };

        // Held across the insert so verify_supply never sees a half-opened account.
        let mut supply = self.supply();
        match self.store.insert_account(account)? {
            AccountInsert::Created(account) => {
                supply.record_opening(account.balance);
                info!(address = %address, balance = %account.balance, "Account opened");
                Ok(account.summary())
            }
            AccountInsert::Existing(account) => {
                debug!(address = %address, "Account already exists");
                Ok(account.summary())
            }
        }
    }

    pub fn account(&self, address: &Address) -> Result<Option<LedgerAccount>> {
        self.store.account(address)
    }

    pub fn exists(&self, address: &Address) -> Result<bool> {
        Ok(self.store.account(address)?.is_some())
    }

    pub fn balance(&self, address: &Address) -> Result<Option<Decimal>> {
        Ok(self.store.account(address)?.map(|a| a.balance))
    }

    /// All accounts, newest first.
    pub fn accounts(&self) -> Result<Vec<AccountSummary>> {
        Ok(self
            .store
            .accounts()?
            .iter()
            .map(LedgerAccount::summary)
            .collect())
    }

    /// Ledger entries for `address`, or all of them, newest first.
    pub fn history(&self, address: Option<&Address>) -> Result<Vec<LedgerEntry>> {
        self.store.history(address)
    }

    /// `Σ balances == Σ openings`.
    pub fn verify_supply(&self) -> Result<()> {
        let supply = self.supply();
        supply.verify(self.store.total_balance()?)
    }

    // ── Transfers ────────────────────────────────────────────────────

    pub fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<TransferOutcome> {
        self.transfer_guarded(from, to, amount, &())
    }

    /// [`transfer`](Self::transfer) with hooks run under the settlement lock.
    pub fn transfer_guarded(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        guard: &dyn CommitGuard,
    ) -> Result<TransferOutcome> {
        let crypto = amount.crypto();
        if crypto <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(crypto));
        }
        if from == to {
            return Err(WalletError::SelfTransfer(from));
        }

        // Address order keeps concurrent opposite-direction transfers deadlock-free.
        let (first, second) = if from < to { (from, to) } else { (to, from) };
        let first_slot = self.slot(first);
        let second_slot = self.slot(second);
        let _first = first_slot.lock().unwrap_or_else(PoisonError::into_inner);
        let _second = second_slot.lock().unwrap_or_else(PoisonError::into_inner);

        let sender = self
            .store
            .account(&from)?
            .ok_or(WalletError::SenderNotFound(from))?;
        if sender.balance < crypto {
            return Err(WalletError::InsufficientBalance {
                needed: crypto,
                available: sender.balance,
            });
        }

        let recipient = self
            .store
            .account(&to)?
            .ok_or(WalletError::RecipientNotFound(to))?;

        let new_sender = sender.balance - crypto;
        if new_sender.is_sign_negative() {
            return Err(WalletError::NegativeBalance(from));
        }
        let new_recipient = recipient
            .balance
            .checked_add(crypto)
            .ok_or_else(|| WalletError::Internal(format!("balance overflow for {to}")))?;

        guard.precheck()?;

        let entry = self.store.commit_transfer(TransferCommit {
            from,
            to,
            amount,
            expected_from_balance: sender.balance,
            expected_to_balance: recipient.balance,
            new_from_balance: new_sender,
            new_to_balance: new_recipient,
            timestamp: self.clock.now_utc(),
        })?;
        guard.committed(&entry);

        info!(
            entry = %entry.id,
            from = %from,
            to = %to,
            amount = %amount.describe(),
            sender_balance = %new_sender,
            recipient_balance = %new_recipient,
            "Transfer committed"
        );

        Ok(TransferOutcome {
            entry,
            sender_balance: new_sender,
            recipient_balance: new_recipient,
        })
    }
}
