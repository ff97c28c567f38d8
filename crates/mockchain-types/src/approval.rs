//! # PendingApproval: the signed, time-bounded transfer intent
//!
//! An approval is minted when a user asks to send funds. It carries the
//! exact message the user must sign and is consumed at most once.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  settlement   ┌───────────┐
//!   │ CREATED ├──────────────▶│ COMPLETED │
//!   └──┬───┬──┘               └───────────┘
//!      │   │ cancel            ┌───────────┐
//!      │   └──────────────────▶│ CANCELLED │
//!      │ now > expires_at      └───────────┘
//!      ▼
//!   ┌─────────┐
//!   │ EXPIRED │
//!   └─────────┘
//! ```
//!
//! All three end states are terminal. A terminal nonce is evicted from the
//! live set and never handed out again.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Nonce};

/// The lifecycle state of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalState {
    /// Awaiting a signature and settlement.
    Created,
    /// Settlement consumed the approval. **Irreversible.**
    Completed,
    /// Cancelled by the user or after a downstream failure.
    Cancelled,
    /// Read or swept after its expiry.
    Expired,
}

impl ApprovalState {
    /// Can this approval transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Completed | Self::Cancelled | Self::Expired)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A live approval held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub nonce: Nonce,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Canonical text the sender signs.
    pub message: String,
    /// Seconds since the UNIX epoch.
    pub created_at: i64,
    /// Last second (inclusive) at which the approval is still valid.
    pub expires_at: i64,
}

impl PendingApproval {
    /// `true` strictly after `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

/// What the requester gets back when an approval is minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTicket {
    pub nonce: Nonce,
    pub message: String,
    pub amount: Amount,
    pub expires_at: i64,
}

#[cfg(test)]
impl PendingApproval {
    pub fn dummy(amount: Amount, created_at: i64, ttl_secs: i64) -> Self {
        Self {
            nonce: Nonce::new("0123456789abcdef"),
            from: Address::from_bytes([1u8; 20]),
            to: Address::from_bytes([2u8; 20]),
            amount,
            message: String::from("dummy"),
            created_at,
            expires_at: created_at + ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn state_transitions_valid() {
        assert!(ApprovalState::Created.can_transition_to(ApprovalState::Completed));
        assert!(ApprovalState::Created.can_transition_to(ApprovalState::Cancelled));
        assert!(ApprovalState::Created.can_transition_to(ApprovalState::Expired));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [
            ApprovalState::Completed,
            ApprovalState::Cancelled,
            ApprovalState::Expired,
        ] {
            assert!(terminal.is_terminal());
            for target in [
                ApprovalState::Created,
                ApprovalState::Completed,
                ApprovalState::Cancelled,
                ApprovalState::Expired,
            ] {
                assert!(!terminal.can_transition_to(target), "{terminal} -> {target}");
            }
        }
    }

    #[test]
    fn expiry_is_inclusive() {
        let approval = PendingApproval::dummy(Amount::Crypto(Decimal::ONE), 0, 10);
        assert!(!approval.is_expired_at(10));
        assert!(approval.is_expired_at(11));
    }
}
