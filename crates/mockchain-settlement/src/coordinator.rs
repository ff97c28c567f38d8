//! Transfer coordination: request → sign → settle.
//!
//! ```text
//!  request()                        settle(nonce, signature)
//!  ─────────                        ────────────────────────
//!  validate parties & amount        load live approval
//!  quote fiat (if any)              verify signature over approval text
//!  check spendable balance          re-quote fiat, check tolerance
//!  mint approval ──▶ ticket         engine.transfer_guarded
//!                                     ├ precheck: approval still live
//!                                     └ committed: complete(nonce)
//!                                   notify
//! ```
//!
//! Once an approval exists, every failure on the settle path cancels it
//! and surfaces the specific error.

use std::sync::Arc;

use mockchain_approval::{ApprovalStore, InMemoryApprovalRegistry};
use mockchain_identity::{CredentialHasher, WalletIdentity, derive_identity, verify};
use mockchain_oracle::PriceOracleGuard;
use mockchain_types::{
    AccountSummary, Address, Amount, ApprovalState, ApprovalTicket, Clock, LedgerEntry, Nonce,
    PendingApproval, Result, WalletConfig, WalletError, round_crypto, round_fiat,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::engine::{CommitGuard, SettlementEngine, TransferOutcome, random_opening_balance};
use crate::notify::{LogNotifier, Notifier, TransferNotice};
use crate::store::MemoryLedgerStore;

/// How the sender specified the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedAmount {
    /// Crypto units.
    Crypto(Decimal),
    /// Whole fiat units, converted through the price oracle.
    Fiat(Decimal),
}

impl RequestedAmount {
    fn value(self) -> Decimal {
        match self {
            Self::Crypto(v) | Self::Fiat(v) => v,
        }
    }
}

/// Re-validates and consumes the approval inside the settlement lock.
struct ApprovalCommit<'a> {
    approvals: &'a dyn ApprovalStore,
    nonce: &'a Nonce,
}

impl CommitGuard for ApprovalCommit<'_> {
    fn precheck(&self) -> Result<()> {
        self.approvals.get(self.nonce).map(|_| ())
    }

    fn committed(&self, _entry: &LedgerEntry) {
        self.approvals.complete(self.nonce);
    }
}

/// Caller-level orchestration of one transfer at a time.
pub struct TransferCoordinator {
    config: WalletConfig,
    engine: Arc<SettlementEngine>,
    approvals: Arc<dyn ApprovalStore>,
    oracle: Option<Arc<PriceOracleGuard>>,
    notifier: Arc<dyn Notifier>,
    hasher: CredentialHasher,
}

impl TransferCoordinator {
    pub fn new(
        config: WalletConfig,
        engine: Arc<SettlementEngine>,
        approvals: Arc<dyn ApprovalStore>,
    ) -> Result<Self> {
        config.validate()?;
        let hasher = CredentialHasher::new(&config.credential)?;
        Ok(Self {
            config,
            engine,
            approvals,
            oracle: None,
            notifier: Arc::new(LogNotifier),
            hasher,
        })
    }

    /// Coordinator over a fresh in-memory ledger and approval registry.
    pub fn in_memory(config: WalletConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let engine = Arc::new(SettlementEngine::new(
            Arc::new(MemoryLedgerStore::new()),
            Arc::clone(&clock),
        ));
        let approvals = Arc::new(InMemoryApprovalRegistry::new(config.approval.clone(), clock));
        Self::new(config, engine, approvals)
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<PriceOracleGuard>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn engine(&self) -> &SettlementEngine {
        &self.engine
    }

    pub fn approvals(&self) -> &dyn ApprovalStore {
        self.approvals.as_ref()
    }

    fn oracle(&self) -> Result<&PriceOracleGuard> {
        self.oracle.as_deref().ok_or(WalletError::OracleNotConfigured)
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Derive the identity for `phrase` and open its account with a random
    /// opening balance. An existing account is returned unchanged.
    pub fn open_wallet(
        &self,
        phrase: &str,
        email: Option<String>,
    ) -> Result<(WalletIdentity, AccountSummary)> {
        let identity = derive_identity(phrase, 0)?;
        let credential = self.hasher.hash(phrase)?;
        let opening = random_opening_balance(&self.config.ledger)?;
        let account = self
            .engine
            .open_account(identity.address(), credential, email, opening)?;
        Ok((identity, account))
    }

    /// Log in with a seed phrase.
    ///
    /// An invalid phrase, an unknown address and a wrong credential all
    /// yield the same `AuthenticationFailed`.
    pub fn authenticate(&self, phrase: &str) -> Result<AccountSummary> {
        let identity = derive_identity(phrase, 0).map_err(|_| WalletError::AuthenticationFailed)?;
        let account = self
            .engine
            .account(&identity.address())?
            .ok_or(WalletError::AuthenticationFailed)?;
        if !self.hasher.verify(phrase, &account.credential_hash) {
            warn!(address = %account.address, "Credential mismatch");
            return Err(WalletError::AuthenticationFailed);
        }
        Ok(account.summary())
    }

    // ── Transfers ────────────────────────────────────────────────────

    /// Validate a transfer intent and mint its approval.
    ///
    /// Amounts are rounded to the precision the approval message carries
    /// before any check, so the balance check, the signed text and the
    /// settled amount all see the same figure.
    pub async fn request(
        &self,
        from: Address,
        to: Address,
        requested: RequestedAmount,
    ) -> Result<ApprovalTicket> {
        let value = match requested {
            RequestedAmount::Crypto(crypto) => round_crypto(crypto),
            RequestedAmount::Fiat(fiat) => round_fiat(fiat),
        };
        if value <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(requested.value()));
        }
        if from == to {
            return Err(WalletError::SelfTransfer(from));
        }
        let available = self
            .engine
            .balance(&from)?
            .ok_or(WalletError::SenderNotFound(from))?;
        if !self.engine.exists(&to)? {
            return Err(WalletError::RecipientNotFound(to));
        }

        let amount = match requested {
            RequestedAmount::Crypto(_) => Amount::Crypto(value),
            RequestedAmount::Fiat(_) => {
                let quote = self.oracle()?.quote(value).await?;
                let crypto = round_crypto(quote.crypto);
                if crypto <= Decimal::ZERO {
                    return Err(WalletError::InvalidAmount(quote.crypto));
                }
                Amount::CryptoWithFiatQuote { crypto, fiat: value }
            }
        };

        if amount.crypto() > available {
            return Err(WalletError::InsufficientBalance {
                needed: amount.crypto(),
                available,
            });
        }

        self.approvals
            .create(from, to, amount, self.config.approval.ttl_secs)
    }

    /// Settle the approval `nonce` with the sender's `signature`.
    pub async fn settle(&self, nonce: &Nonce, signature: &str) -> Result<TransferOutcome> {
        let approval = self.live_approval(nonce)?;

        match self.validate_and_commit(&approval, signature).await {
            Ok(outcome) => {
                self.notify(&approval, &outcome);
                Ok(outcome)
            }
            Err(err) => {
                if self.approvals.cancel(nonce) {
                    info!(nonce = %nonce, error = %err, "Settlement failed; approval cancelled");
                }
                Err(err)
            }
        }
    }

    /// Drop an approval without settling it.
    pub fn cancel(&self, nonce: &Nonce) -> bool {
        self.approvals.cancel(nonce)
    }

    /// Evict expired approvals.
    pub fn sweep_expired(&self) -> usize {
        self.approvals.sweep()
    }

    fn live_approval(&self, nonce: &Nonce) -> Result<PendingApproval> {
        self.approvals.get(nonce).map_err(|err| match err {
            WalletError::NonceNotFound(_)
                if self.approvals.status(nonce) == Some(ApprovalState::Expired) =>
            {
                WalletError::NonceExpired(nonce.clone())
            }
            other => other,
        })
    }

    async fn validate_and_commit(
        &self,
        approval: &PendingApproval,
        signature: &str,
    ) -> Result<TransferOutcome> {
        if !verify(&approval.message, signature, &approval.from) {
            warn!(nonce = %approval.nonce, from = %approval.from, "Signature rejected");
            return Err(WalletError::SignatureMismatch(approval.from));
        }

        if let Amount::CryptoWithFiatQuote { crypto, fiat } = approval.amount {
            let oracle = self.oracle()?;
            let fresh = oracle.quote(fiat).await?;
            oracle.ensure_within_tolerance(crypto, round_crypto(fresh.crypto))?;
        }

        let guard = ApprovalCommit {
            approvals: self.approvals.as_ref(),
            nonce: &approval.nonce,
        };
        self.engine
            .transfer_guarded(approval.from, approval.to, approval.amount, &guard)
            .map_err(|err| match err {
                WalletError::NonceNotFound(_)
                    if self.approvals.status(&approval.nonce) == Some(ApprovalState::Expired) =>
                {
                    WalletError::NonceExpired(approval.nonce.clone())
                }
                other => other,
            })
    }

    fn notify(&self, approval: &PendingApproval, outcome: &TransferOutcome) {
        let email_of = |address: &Address| {
            self.engine
                .account(address)
                .ok()
                .flatten()
                .and_then(|account| account.email)
        };
        let notice = TransferNotice {
            entry: outcome.entry.id,
            from: approval.from,
            to: approval.to,
            sender_email: email_of(&approval.from),
            recipient_email: email_of(&approval.to),
            amount: approval.amount,
            sender_balance: outcome.sender_balance,
            recipient_balance: outcome.recipient_balance,
        };
        if let Err(err) = self.notifier.transfer_settled(&notice) {
            warn!(entry = %outcome.entry.id, error = %err, "Notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockchain_identity::generate_seed_phrase;
    use mockchain_types::{CredentialConfig, ManualClock};

    fn config() -> WalletConfig {
        WalletConfig {
            credential: CredentialConfig::insecure_fast(),
            ..WalletConfig::default()
        }
    }

    fn coordinator() -> TransferCoordinator {
        TransferCoordinator::in_memory(config(), Arc::new(ManualClock::at(0))).unwrap()
    }

    #[test]
    fn open_then_authenticate() {
        let coordinator = coordinator();
        let phrase = generate_seed_phrase().unwrap();
        let (identity, account) = coordinator
            .open_wallet(&phrase, Some("a@example.com".into()))
            .unwrap();
        assert_eq!(account.address, identity.address());
        assert!(account.balance >= Decimal::ONE && account.balance <= Decimal::TEN);

        let logged_in = coordinator.authenticate(&phrase).unwrap();
        assert_eq!(logged_in, account);
    }

    #[test]
    fn reopening_keeps_balance() {
        let coordinator = coordinator();
        let phrase = generate_seed_phrase().unwrap();
        let (_, first) = coordinator.open_wallet(&phrase, None).unwrap();
        let (_, second) = coordinator.open_wallet(&phrase, None).unwrap();
        assert_eq!(first.balance, second.balance);
        coordinator.engine().verify_supply().unwrap();
    }

    #[test]
    fn authentication_failures_are_indistinguishable() {
        let coordinator = coordinator();
        let phrase = generate_seed_phrase().unwrap();
        coordinator.open_wallet(&phrase, None).unwrap();

        // Account exists but its stored credential belongs to nobody.
        let mismatched = generate_seed_phrase().unwrap();
        let identity = derive_identity(&mismatched, 0).unwrap();
        coordinator
            .engine()
            .open_account(identity.address(), "bogus".into(), None, Decimal::ONE)
            .unwrap();

        let unknown = generate_seed_phrase().unwrap();
        for attempt in ["not a phrase", unknown.as_str(), mismatched.as_str()] {
            assert!(matches!(
                coordinator.authenticate(attempt),
                Err(WalletError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let mut bad = config();
        bad.approval.ttl_secs = 0;
        assert!(matches!(
            TransferCoordinator::in_memory(bad, Arc::new(ManualClock::at(0))),
            Err(WalletError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn fiat_without_oracle_rejected() {
        let coordinator = coordinator();
        let (a, _) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();
        let (b, _) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();
        let err = coordinator
            .request(a.address(), b.address(), RequestedAmount::Fiat(Decimal::new(100, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::OracleNotConfigured));
        assert_eq!(coordinator.approvals().live_count(), 0);
    }

    #[tokio::test]
    async fn request_checks_run_before_minting() {
        let coordinator = coordinator();
        let (a, account) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();
        let (b, _) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();
        let stranger = Address::from_bytes([0xee; 20]);

        let cases = [
            (a.address(), b.address(), RequestedAmount::Crypto(Decimal::ZERO)),
            (a.address(), a.address(), RequestedAmount::Crypto(Decimal::ONE)),
            (a.address(), stranger, RequestedAmount::Crypto(Decimal::ONE)),
            (stranger, b.address(), RequestedAmount::Crypto(Decimal::ONE)),
            (
                a.address(),
                b.address(),
                RequestedAmount::Crypto(account.balance + Decimal::ONE),
            ),
        ];
        for (from, to, amount) in cases {
            assert!(coordinator.request(from, to, amount).await.is_err());
        }
        assert_eq!(coordinator.approvals().live_count(), 0);
    }

    #[tokio::test]
    async fn unknown_sender_reported_before_unknown_recipient() {
        let coordinator = coordinator();
        let err = coordinator
            .request(
                Address::from_bytes([0xe1; 20]),
                Address::from_bytes([0xe2; 20]),
                RequestedAmount::Crypto(Decimal::ONE),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::SenderNotFound(_)));
    }

    #[tokio::test]
    async fn amount_below_signed_precision_rejected() {
        let coordinator = coordinator();
        let (a, _) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();
        let (b, _) = coordinator
            .open_wallet(&generate_seed_phrase().unwrap(), None)
            .unwrap();

        // 0.0000004 renders as 0.000000 and would sign for nothing.
        let err = coordinator
            .request(a.address(), b.address(), RequestedAmount::Crypto(Decimal::new(4, 7)))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));

        let ticket = coordinator
            .request(a.address(), b.address(), RequestedAmount::Crypto(Decimal::new(12_345_675, 7)))
            .await
            .unwrap();
        assert_eq!(ticket.amount, Amount::Crypto(Decimal::new(1_234_568, 6)));
    }
}
