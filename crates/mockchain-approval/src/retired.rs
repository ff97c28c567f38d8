//! Retired nonces, so a consumed nonce is never handed out again.
//!
//! Each terminal nonce is remembered with its end state in a bounded set.
//! When the set is full the oldest entry is evicted to make room, which keeps
//! memory predictable in long-running wallets.

use std::collections::{HashMap, VecDeque};

use mockchain_types::{ApprovalState, Nonce};

/// Bounded memory of terminal nonces and how they ended.
#[derive(Debug)]
pub struct RetiredNonces {
    states: HashMap<Nonce, ApprovalState>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<Nonce>,
    capacity: usize,
}

impl RetiredNonces {
    /// A set holding at most `capacity` nonces (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Record `nonce` as ended in `state`. A nonce is retired once; later
    /// calls keep the first recorded state.
    pub fn retire(&mut self, nonce: Nonce, state: ApprovalState) {
        debug_assert!(state.is_terminal(), "retiring a live state: {state}");
        if self.states.contains_key(&nonce) {
            return;
        }

        if self.states.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.states.remove(&oldest);
            }
        }

        self.order.push_back(nonce.clone());
        self.states.insert(nonce, state);
    }

    pub fn state_of(&self, nonce: &Nonce) -> Option<ApprovalState> {
        self.states.get(nonce).copied()
    }

    pub fn contains(&self, nonce: &Nonce) -> bool {
        self.states.contains_key(nonce)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
