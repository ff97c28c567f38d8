//! Configuration types for the wallet core.
//!
//! Every field has a default, so an empty JSON object is a complete
//! configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, WalletError, constants};

/// Top-level wallet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub approval: ApprovalConfig,
    pub oracle: OracleConfig,
    pub ledger: LedgerConfig,
    pub credential: CredentialConfig,
}

impl WalletConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| WalletError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.approval.ttl_secs == 0 {
            return Err(WalletError::Configuration(
                "approval.ttl_secs must be > 0".into(),
            ));
        }
        if self.approval.retired_nonce_capacity == 0 {
            return Err(WalletError::Configuration(
                "approval.retired_nonce_capacity must be > 0".into(),
            ));
        }
        if self.approval.max_nonce_attempts == 0 {
            return Err(WalletError::Configuration(
                "approval.max_nonce_attempts must be > 0".into(),
            ));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(WalletError::Configuration(
                "oracle.timeout_secs must be > 0".into(),
            ));
        }
        if self.oracle.price_tolerance.is_sign_negative() {
            return Err(WalletError::Configuration(format!(
                "oracle.price_tolerance must be >= 0, got {}",
                self.oracle.price_tolerance
            )));
        }
        if self.ledger.opening_balance_min.is_sign_negative()
            || self.ledger.opening_balance_min > self.ledger.opening_balance_max
        {
            return Err(WalletError::Configuration(format!(
                "ledger opening balance range [{}, {}] is invalid",
                self.ledger.opening_balance_min, self.ledger.opening_balance_max
            )));
        }
        Ok(())
    }
}

/// Approval registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Seconds an approval stays valid after creation.
    pub ttl_secs: u64,
    /// How many terminal nonces are remembered to block reuse.
    pub retired_nonce_capacity: usize,
    /// Nonce candidates tried before reporting exhaustion.
    pub max_nonce_attempts: u32,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            ttl_secs: constants::DEFAULT_APPROVAL_TTL_SECS,
            retired_nonce_capacity: constants::DEFAULT_RETIRED_NONCE_CAPACITY,
            max_nonce_attempts: constants::DEFAULT_MAX_NONCE_ATTEMPTS,
        }
    }
}

/// Price oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub source_asset_denom: String,
    pub source_asset_chain_id: String,
    pub dest_asset_denom: String,
    pub dest_asset_chain_id: String,
    /// Address sent as the route recipient; quotes never execute.
    pub recipient_placeholder: String,
    pub slippage_tolerance_percent: String,
    /// Accepted relative drift between the signed and the fresh quote.
    pub price_tolerance: Decimal,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ORACLE_ENDPOINT.to_string(),
            timeout_secs: constants::DEFAULT_ORACLE_TIMEOUT_SECS,
            source_asset_denom: constants::DEFAULT_SOURCE_ASSET_DENOM.to_string(),
            source_asset_chain_id: constants::DEFAULT_CHAIN_ID.to_string(),
            dest_asset_denom: constants::DEFAULT_DEST_ASSET_DENOM.to_string(),
            dest_asset_chain_id: constants::DEFAULT_CHAIN_ID.to_string(),
            recipient_placeholder: constants::DEFAULT_RECIPIENT_PLACEHOLDER.to_string(),
            slippage_tolerance_percent: constants::DEFAULT_SLIPPAGE_PERCENT.to_string(),
            price_tolerance: Decimal::new(1, 2), // 1%
        }
    }
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Lower bound of the faucet balance a new account opens with.
    pub opening_balance_min: Decimal,
    /// Upper bound of the faucet balance a new account opens with.
    pub opening_balance_max: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            opening_balance_min: Decimal::ONE,
            opening_balance_max: Decimal::TEN,
        }
    }
}

/// Argon2id cost parameters for seed-phrase credentials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Memory cost in KiB.
    pub m_cost_kib: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            m_cost_kib: 19_456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl CredentialConfig {
    /// Minimum-cost parameters that keep tests fast. **Never use in production.**
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn insecure_fast() -> Self {
        Self {
            m_cost_kib: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }
}
