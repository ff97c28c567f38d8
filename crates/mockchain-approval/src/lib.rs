//! # mockchain-approval
//!
//! Turns a transfer intent into a signed, time-bounded approval.
//!
//! - [`message`]: the canonical text a sender signs, and its parser
//! - [`registry`]: the nonce-keyed store of live approvals with expiry
//! - [`retired`]: bounded memory of terminal nonces so none is reused

pub mod message;
pub mod registry;
pub mod retired;

pub use message::{ApprovalMessage, build_approval_message, parse_approval_message};
pub use registry::{ApprovalStore, InMemoryApprovalRegistry};
pub use retired::RetiredNonces;
