//! Error types for the Mockchain wallet.
//!
//! All errors use the `MW_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Identity errors
//! - 2xx: Ledger / balance errors
//! - 3xx: Approval / signature errors
//! - 4xx: Price oracle errors
//! - 8xx: Invariant violations
//! - 9xx: Storage / general / internal errors

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, Nonce};

/// Why a call to the price oracle produced no usable quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleFailure {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection or transport failure.
    Network(String),
    /// The oracle answered with a non-success HTTP status.
    Status(u16),
    /// The response body could not be interpreted as a quote.
    Malformed(String),
}

impl fmt::Display for OracleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Network(reason) => write!(f, "network failure: {reason}"),
            Self::Status(code) => write!(f, "non-success status {code}"),
            Self::Malformed(reason) => write!(f, "malformed payload: {reason}"),
        }
    }
}

/// Central error enum for all wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    // =================================================================
    // Identity Errors (1xx)
    // =================================================================
    /// The seed phrase failed word-list or checksum validation.
    #[error("MW_ERR_100: Invalid seed phrase")]
    InvalidSeedPhrase,

    /// Hierarchical key derivation failed for a valid phrase.
    #[error("MW_ERR_101: Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The seed phrase does not unlock any stored account.
    #[error("MW_ERR_102: Authentication failed")]
    AuthenticationFailed,

    /// The credential hash could not be produced.
    #[error("MW_ERR_103: Credential hashing failed: {0}")]
    CredentialHash(String),

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// The sending account does not exist.
    #[error("MW_ERR_200: Sender account not found: {0}")]
    SenderNotFound(Address),

    /// The receiving account does not exist (no implicit creation).
    #[error("MW_ERR_201: Recipient account not found: {0}")]
    RecipientNotFound(Address),

    /// Not enough balance to cover the transfer.
    #[error("MW_ERR_202: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// A balance mutation would produce a negative value.
    #[error("MW_ERR_203: Transfer would leave {0} with a negative balance")]
    NegativeBalance(Address),

    /// The amount is zero or negative.
    #[error("MW_ERR_204: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Sender and recipient are the same account.
    #[error("MW_ERR_205: Self-transfer rejected for {0}")]
    SelfTransfer(Address),

    /// A compare-and-set balance update found the balance already moved.
    #[error("MW_ERR_206: Balance of {0} changed during commit")]
    BalanceConflict(Address),

    /// The text is not a `0x`-prefixed 20-byte hex address.
    #[error("MW_ERR_207: Invalid address: {0}")]
    InvalidAddress(String),

    // =================================================================
    // Approval Errors (3xx)
    // =================================================================
    /// No live approval exists for this nonce.
    #[error("MW_ERR_300: Approval not found for nonce {0}")]
    NonceNotFound(Nonce),

    /// The approval for this nonce passed its expiry.
    #[error("MW_ERR_301: Approval expired for nonce {0}")]
    NonceExpired(Nonce),

    /// The signature does not recover to the approval's sender.
    #[error("MW_ERR_302: Signature does not match sender {0}")]
    SignatureMismatch(Address),

    /// The approval message text does not follow the canonical layout.
    #[error("MW_ERR_303: Malformed approval message: {reason}")]
    MalformedApprovalMessage { reason: String },

    /// Every nonce candidate collided with a live or retired nonce.
    #[error("MW_ERR_304: Could not allocate a fresh nonce after {attempts} attempts")]
    NonceSpaceExhausted { attempts: u32 },

    // =================================================================
    // Oracle Errors (4xx)
    // =================================================================
    /// The price oracle produced no usable quote.
    #[error("MW_ERR_400: Price oracle error: {0}")]
    Oracle(OracleFailure),

    /// The fresh quote drifted beyond the accepted tolerance.
    #[error(
        "MW_ERR_401: Price tolerance exceeded: quoted {original}, now {current} (tolerance {tolerance})"
    )]
    PriceToleranceExceeded {
        original: Decimal,
        current: Decimal,
        tolerance: Decimal,
    },

    /// A fiat-denominated transfer was requested without an oracle.
    #[error("MW_ERR_402: No price oracle configured for fiat transfers")]
    OracleNotConfigured,

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Supply conservation invariant violated. Critical safety alert.
    #[error("MW_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Storage / General (9xx)
    // =================================================================
    /// The ledger store cannot be reached.
    #[error("MW_ERR_900: Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration error (invalid values, unparseable file).
    #[error("MW_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("MW_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("MW_ERR_999: Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Whether retrying the same operation can plausibly succeed.
    ///
    /// Only oracle failures qualify; everything else needs a new approval
    /// cycle.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Oracle(_))
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, WalletError>;

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
