//! Ledger persistence.
//!
//! [`LedgerStore`] is the seam to whatever holds accounts and entries. A
//! transfer commit is compare-and-set on both balances and appends its entry
//! in the same step: either all three writes land or none do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use mockchain_types::{
    Address, Amount, EntryId, EntryStatus, LedgerAccount, LedgerEntry, Result, WalletError,
};
use rust_decimal::Decimal;

/// Result of inserting an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountInsert {
    Created(LedgerAccount),
    /// The address was already present; the stored record is returned as is.
    Existing(LedgerAccount),
}

impl AccountInsert {
    pub fn account(&self) -> &LedgerAccount {
        match self {
            Self::Created(account) | Self::Existing(account) => account,
        }
    }
}

/// One transfer, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommit {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Balances read before computing the new ones.
    pub expected_from_balance: Decimal,
    pub expected_to_balance: Decimal,
    pub new_from_balance: Decimal,
    pub new_to_balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Storage seam for accounts and ledger entries.
pub trait LedgerStore: Send + Sync {
    fn account(&self, address: &Address) -> Result<Option<LedgerAccount>>;

    /// Insert `account` unless its address already exists.
    fn insert_account(&self, account: LedgerAccount) -> Result<AccountInsert>;

    /// Apply both balance updates and append the entry atomically.
    ///
    /// Fails with `BalanceConflict` if either stored balance differs from
    /// the expected one, leaving everything unchanged.
    fn commit_transfer(&self, commit: TransferCommit) -> Result<LedgerEntry>;

    /// All accounts, newest first.
    fn accounts(&self) -> Result<Vec<LedgerAccount>>;

    /// Entries involving `address` (or all entries), newest first.
    fn history(&self, address: Option<&Address>) -> Result<Vec<LedgerEntry>>;

    /// Sum of every balance.
    fn total_balance(&self) -> Result<Decimal>;
}

#[derive(Debug)]
struct MemoryState {
    accounts: HashMap<Address, LedgerAccount>,
    /// Insertion order of addresses.
    order: Vec<Address>,
    entries: Vec<LedgerEntry>,
    next_id: EntryId,
}

/// In-memory [`LedgerStore`].
#[derive(Debug)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                accounts: HashMap::new(),
                order: Vec::new(),
                entries: Vec::new(),
                next_id: EntryId(1),
            }),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate an outage: every call fails with `StorageUnavailable`.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Overwrite a stored balance behind the engine's back.
    /// **Never use in production.**
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn force_balance(&self, address: &Address, balance: Decimal) {
        if let Ok(mut state) = self.lock() {
            if let Some(account) = state.accounts.get_mut(address) {
                account.balance = balance;
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(WalletError::StorageUnavailable("ledger store offline".into()));
        }
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn account(&self, address: &Address) -> Result<Option<LedgerAccount>> {
        Ok(self.lock()?.accounts.get(address).cloned())
    }

    fn insert_account(&self, account: LedgerAccount) -> Result<AccountInsert> {
        let mut state = self.lock()?;
        if let Some(existing) = state.accounts.get(&account.address) {
            return Ok(AccountInsert::Existing(existing.clone()));
        }
        state.order.push(account.address);
        state.accounts.insert(account.address, account.clone());
        Ok(AccountInsert::Created(account))
    }

    fn commit_transfer(&self, commit: TransferCommit) -> Result<LedgerEntry> {
        let mut state = self.lock()?;

        let from_balance = state
            .accounts
            .get(&commit.from)
            .map(|a| a.balance)
            .ok_or(WalletError::SenderNotFound(commit.from))?;
        let to_balance = state
            .accounts
            .get(&commit.to)
            .map(|a| a.balance)
            .ok_or(WalletError::RecipientNotFound(commit.to))?;

        if from_balance != commit.expected_from_balance {
            return Err(WalletError::BalanceConflict(commit.from));
        }
        if to_balance != commit.expected_to_balance {
            return Err(WalletError::BalanceConflict(commit.to));
        }
        if commit.new_from_balance.is_sign_negative() {
            return Err(WalletError::NegativeBalance(commit.from));
        }
        if commit.new_to_balance.is_sign_negative() {
            return Err(WalletError::NegativeBalance(commit.to));
        }

        // All checks passed; nothing below can fail.
        if let Some(sender) = state.accounts.get_mut(&commit.from) {
            sender.balance = commit.new_from_balance;
        }
        if let Some(recipient) = state.accounts.get_mut(&commit.to) {
            recipient.balance = commit.new_to_balance;
        }

        let id = state.next_id;
        state.next_id = id.next();
        let entry = LedgerEntry {
            id,
            from: commit.from,
            to: commit.to,
            amount_crypto: commit.amount.crypto(),
            amount_fiat: commit.amount.fiat(),
            timestamp: commit.timestamp,
            status: EntryStatus::Success,
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    fn accounts(&self) -> Result<Vec<LedgerAccount>> {
        let state = self.lock()?;
        let mut accounts: Vec<LedgerAccount> = state
            .order
            .iter()
            .rev()
            .filter_map(|address| state.accounts.get(address).cloned())
            .collect();
        // Stable: equal timestamps keep newest-inserted first.
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    fn history(&self, address: Option<&Address>) -> Result<Vec<LedgerEntry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .rev()
            .filter(|entry| address.is_none_or(|a| entry.involves(a)))
            .cloned()
            .collect())
    }

    fn total_balance(&self) -> Result<Decimal> {
        Ok(self.lock()?.accounts.values().map(|a| a.balance).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn account(byte: u8, balance: i64, created: i64) -> LedgerAccount {
        LedgerAccount {
            address: addr(byte),
            credential_hash: "$argon2id$test".into(),
            email: None,
            balance: Decimal::new(balance, 0),
            created_at: DateTime::from_timestamp(created, 0).unwrap(),
        }
    }

    fn commit(from: u8, to: u8, expected: (i64, i64), new: (i64, i64)) -> TransferCommit {
        TransferCommit {
            from: addr(from),
            to: addr(to),
            amount: Amount::Crypto(Decimal::new(new.1 - expected.1, 0)),
            expected_from_balance: Decimal::new(expected.0, 0),
            expected_to_balance: Decimal::new(expected.1, 0),
            new_from_balance: Decimal::new(new.0, 0),
            new_to_balance: Decimal::new(new.1, 0),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let store = MemoryLedgerStore::new();
        assert!(matches!(
            store.insert_account(account(1, 5, 0)).unwrap(),
            AccountInsert::Created(_)
        ));
        let again = store.insert_account(account(1, 9, 0)).unwrap();
        assert!(matches!(again, AccountInsert::Existing(_)));
        assert_eq!(again.account().balance, Decimal::new(5, 0));
        assert_eq!(store.accounts().unwrap().len(), 1);
    }

    #[test]
    fn commit_moves_balances_and_appends() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 5, 0)).unwrap();
        store.insert_account(account(2, 3, 0)).unwrap();

        let entry = store.commit_transfer(commit(1, 2, (5, 3), (4, 4))).unwrap();
        assert_eq!(entry.id, EntryId(1));
        assert_eq!(entry.status, EntryStatus::Success);
        assert_eq!(store.account(&addr(1)).unwrap().unwrap().balance, Decimal::new(4, 0));
        assert_eq!(store.account(&addr(2)).unwrap().unwrap().balance, Decimal::new(4, 0));

        let next = store.commit_transfer(commit(1, 2, (4, 4), (3, 5))).unwrap();
        assert_eq!(next.id, EntryId(2));
    }

    #[test]
    fn stale_balance_conflicts_without_writing() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 5, 0)).unwrap();
        store.insert_account(account(2, 3, 0)).unwrap();

        let err = store.commit_transfer(commit(1, 2, (6, 3), (5, 4))).unwrap_err();
        assert!(matches!(err, WalletError::BalanceConflict(a) if a == addr(1)));
        let err = store.commit_transfer(commit(1, 2, (5, 2), (4, 3))).unwrap_err();
        assert!(matches!(err, WalletError::BalanceConflict(a) if a == addr(2)));

        assert_eq!(store.total_balance().unwrap(), Decimal::new(8, 0));
        assert!(store.history(None).unwrap().is_empty());
    }

    #[test]
    fn negative_result_rejected() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 1, 0)).unwrap();
        store.insert_account(account(2, 0, 0)).unwrap();
        let err = store.commit_transfer(commit(1, 2, (1, 0), (-1, 2))).unwrap_err();
        assert!(matches!(err, WalletError::NegativeBalance(_)));
        assert_eq!(store.account(&addr(1)).unwrap().unwrap().balance, Decimal::ONE);
    }

    #[test]
    fn missing_accounts_reported() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 5, 0)).unwrap();
        assert!(matches!(
            store.commit_transfer(commit(9, 1, (5, 5), (4, 6))),
            Err(WalletError::SenderNotFound(_))
        ));
        assert!(matches!(
            store.commit_transfer(commit(1, 9, (5, 0), (4, 1))),
            Err(WalletError::RecipientNotFound(_))
        ));
    }

    #[test]
    fn listings_are_newest_first() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 5, 100)).unwrap();
        store.insert_account(account(2, 5, 300)).unwrap();
        store.insert_account(account(3, 5, 200)).unwrap();
        store.insert_account(account(4, 5, 300)).unwrap();
        let order: Vec<Address> = store.accounts().unwrap().iter().map(|a| a.address).collect();
        assert_eq!(order, vec![addr(4), addr(2), addr(3), addr(1)]);

        store.commit_transfer(commit(1, 2, (5, 5), (4, 6))).unwrap();
        store.commit_transfer(commit(3, 4, (5, 5), (4, 6))).unwrap();
        let all = store.history(None).unwrap();
        assert_eq!(all[0].id, EntryId(2));
        assert_eq!(all[1].id, EntryId(1));

        let only_first = store.history(Some(&addr(1))).unwrap();
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].id, EntryId(1));
    }

    #[test]
    fn offline_store_is_unavailable() {
        let store = MemoryLedgerStore::new();
        store.insert_account(account(1, 5, 0)).unwrap();
        store.set_offline(true);
        assert!(matches!(
            store.account(&addr(1)),
            Err(WalletError::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.total_balance(),
            Err(WalletError::StorageUnavailable(_))
        ));
        store.set_offline(false);
        assert!(store.account(&addr(1)).unwrap().is_some());
    }
}
