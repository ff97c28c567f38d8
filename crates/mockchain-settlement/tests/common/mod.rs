//! Shared fixture: a coordinator over a manual clock, an in-memory ledger
//! and a fixed-rate quote source.

#![allow(dead_code)]

use std::sync::Arc;

use mockchain_approval::InMemoryApprovalRegistry;
use mockchain_identity::{WalletIdentity, derive_identity};
use mockchain_oracle::{PriceOracleGuard, StaticQuoteSource};
use mockchain_settlement::{MemoryLedgerStore, SettlementEngine, TransferCoordinator};
use mockchain_types::{Address, CredentialConfig, ManualClock, WalletConfig};
use rust_decimal::Decimal;

/// Hardhat's development phrase; indices 0..3 give stable test identities.
pub const DEV_PHRASE: &str = "test test test test test test test test test test test junk";

/// 1 USD = 0.0004 ETH.
pub fn base_rate() -> Decimal {
    Decimal::new(4, 4)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryLedgerStore>,
    pub quotes: Arc<StaticQuoteSource>,
    pub coordinator: Arc<TransferCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(WalletConfig::default())
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        let mut config = WalletConfig::default();
        config.approval.ttl_secs = ttl_secs;
        Self::with_config(config)
    }

    pub fn with_config(mut config: WalletConfig) -> Self {
        init_tracing();
        config.credential = CredentialConfig::insecure_fast();

        let clock = Arc::new(ManualClock::at(0));
        let store = Arc::new(MemoryLedgerStore::new());
        let quotes = Arc::new(StaticQuoteSource::new(base_rate()));

        let engine = Arc::new(SettlementEngine::new(
            Arc::clone(&store) as _,
            Arc::clone(&clock) as _,
        ));
        let approvals = Arc::new(InMemoryApprovalRegistry::new(
            config.approval.clone(),
            Arc::clone(&clock) as _,
        ));
        let oracle = Arc::new(PriceOracleGuard::from_config(
            Arc::clone(&quotes) as _,
            &config.oracle,
        ));
        let coordinator = TransferCoordinator::new(config, engine, approvals)
            .expect("valid config")
            .with_oracle(oracle);

        Self {
            clock,
            store,
            quotes,
            coordinator: Arc::new(coordinator),
        }
    }

    /// Identity `index` of the dev phrase, opened with `balance`.
    pub fn fund(&self, index: u32, balance: Decimal, email: Option<&str>) -> WalletIdentity {
        let identity = derive_identity(DEV_PHRASE, index).expect("dev phrase derives");
        self.coordinator
            .engine()
            .open_account(
                identity.address(),
                format!("credential-{index}"),
                email.map(str::to_owned),
                balance,
            )
            .expect("account opens");
        identity
    }

    pub fn balance(&self, address: &Address) -> Decimal {
        self.coordinator
            .engine()
            .balance(address)
            .expect("store online")
            .expect("account exists")
    }
}
