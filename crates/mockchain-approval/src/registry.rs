//! Pending approval registry.
//!
//! Holds every live approval keyed by nonce. All operations take one
//! registry-wide lock and are O(1) apart from [`ApprovalStore::sweep`].
//!
//! Expiry is passive: an entry past `expires_at` is evicted the next time it
//! is read or swept, and its nonce is retired as `EXPIRED`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockchain_types::{
    Address, Amount, ApprovalConfig, ApprovalState, ApprovalTicket, Clock, Nonce, PendingApproval,
    Result, WalletError, constants::NONCE_HEX_LEN,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::message::build_approval_message;
use crate::retired::RetiredNonces;

/// Storage seam for pending approvals.
pub trait ApprovalStore: Send + Sync {
    /// Mint a new approval valid for `ttl_secs` from now.
    fn create(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        ttl_secs: u64,
    ) -> Result<ApprovalTicket>;

    /// The live approval for `nonce`, valid up to and including `expires_at`.
    fn get(&self, nonce: &Nonce) -> Result<PendingApproval>;

    /// Consume the approval after settlement. Returns `false` if it was not live.
    fn complete(&self, nonce: &Nonce) -> bool;

    /// Drop the approval without settling. Returns `false` if it was not live.
    fn cancel(&self, nonce: &Nonce) -> bool;

    /// Evict every expired entry, returning how many were removed.
    fn sweep(&self) -> usize;

    /// Current state: `CREATED` while live, the end state once retired,
    /// `None` if the nonce is unknown or has aged out of the retired set.
    fn status(&self, nonce: &Nonce) -> Option<ApprovalState>;

    fn live_count(&self) -> usize;
}

struct RegistryState {
    live: HashMap<Nonce, PendingApproval>,
    retired: RetiredNonces,
}

impl RegistryState {
    fn is_taken(&self, nonce: &Nonce) -> bool {
        self.live.contains_key(nonce) || self.retired.contains(nonce)
    }

    /// Move a live approval to `state`. Live approvals are always
    /// `Created`, so only transitions out of `Created` are accepted.
    fn retire(&mut self, nonce: &Nonce, state: ApprovalState) -> bool {
        if !ApprovalState::Created.can_transition_to(state) {
            return false;
        }
        match self.live.remove(nonce) {
            Some(_) => {
                self.retired.retire(nonce.clone(), state);
                true
            }
            None => false,
        }
    }
}

/// In-memory [`ApprovalStore`] with an injected clock.
pub struct InMemoryApprovalRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
    config: ApprovalConfig,
}

impl InMemoryApprovalRegistry {
    pub fn new(config: ApprovalConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                live: HashMap::new(),
                retired: RetiredNonces::new(config.retired_nonce_capacity),
            }),
            clock,
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First [`NONCE_HEX_LEN`] hex chars of SHA-256 over the pair and time,
/// with `attempt` appended after the first try.
fn candidate_nonce(from: &Address, to: &Address, now: i64, attempt: u32) -> Nonce {
    let seed = if attempt == 0 {
        format!("{from}{to}{now}")
    } else {
        format!("{from}{to}{now}#{attempt}")
    };
    let digest = hex::encode(Sha256::digest(seed.as_bytes()));
    Nonce::new(&digest[..NONCE_HEX_LEN])
}

impl ApprovalStore for InMemoryApprovalRegistry {
    fn create(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        ttl_secs: u64,
    ) -> Result<ApprovalTicket> {
        // The stored amount is exactly what the message says.
        let amount = amount.at_signed_precision();
        let now = self.clock.now();
        let expires_at = now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));

        let mut state = self.lock();
        let nonce = (0..self.config.max_nonce_attempts)
            .map(|attempt| candidate_nonce(&from, &to, now, attempt))
            .find(|nonce| !state.is_taken(nonce))
            .ok_or(WalletError::NonceSpaceExhausted {
                attempts: self.config.max_nonce_attempts,
            })?;

        let message = build_approval_message(&from, &to, &amount, &nonce, expires_at);
        let approval = PendingApproval {
            nonce: nonce.clone(),
            from,
            to,
            amount,
            message: message.clone(),
            created_at: now,
            expires_at,
        };
        state.live.insert(nonce.clone(), approval);
        drop(state);

        info!(
            nonce = %nonce,
            from = %from,
            to = %to,
            amount = %amount.describe(),
            expires_at,
            "Approval created"
        );

        Ok(ApprovalTicket {
            nonce,
            message,
            amount,
            expires_at,
        })
    }

    fn get(&self, nonce: &Nonce) -> Result<PendingApproval> {
        let now = self.clock.now();
        let mut state = self.lock();

        let expired = match state.live.get(nonce) {
            Some(approval) if approval.is_expired_at(now) => true,
            Some(approval) => return Ok(approval.clone()),
            None => false,
        };
        if expired {
            state.retire(nonce, ApprovalState::Expired);
            debug!(nonce = %nonce, now, "Approval expired on read");
        }
        Err(WalletError::NonceNotFound(nonce.clone()))
    }

    fn complete(&self, nonce: &Nonce) -> bool {
        let removed = self.lock().retire(nonce, ApprovalState::Completed);
        if removed {
            info!(nonce = %nonce, "Approval completed");
        }
        removed
    }

    fn cancel(&self, nonce: &Nonce) -> bool {
        let removed = self.lock().retire(nonce, ApprovalState::Cancelled);
        if removed {
            info!(nonce = %nonce, "Approval cancelled");
        }
        removed
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        let expired: Vec<Nonce> = state
            .live
            .values()
            .filter(|approval| approval.is_expired_at(now))
            .map(|approval| approval.nonce.clone())
            .collect();
        for nonce in &expired {
            state.retire(nonce, ApprovalState::Expired);
        }
        drop(state);

        if !expired.is_empty() {
            debug!(count = expired.len(), now, "Swept expired approvals");
        }
        expired.len()
    }

    fn status(&self, nonce: &Nonce) -> Option<ApprovalState> {
        let state = self.lock();
        if state.live.contains_key(nonce) {
            return Some(ApprovalState::Created);
        }
        state.retired.state_of(nonce)
    }

    fn live_count(&self) -> usize {
        self.lock().live.len()
    }
}
