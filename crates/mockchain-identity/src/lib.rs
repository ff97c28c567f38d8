//! # mockchain-identity
//!
//! Everything a wallet needs to prove who it is:
//!
//! - [`seed_phrase`]: 12-word BIP-39 English mnemonics
//! - [`identity`]: BIP-32 derivation at `m/44'/60'/0'/0/{index}` into a
//!   secp256k1 keypair and its EIP-55 address
//! - [`signature`]: Ethereum personal-message signatures with public-key
//!   recovery
//! - [`credential`]: salted Argon2id credential hashes for account login
//!
//! Seed phrases and private keys never appear in logs or `Debug` output.

pub mod credential;
pub mod identity;
pub mod seed_phrase;
pub mod signature;

pub use credential::CredentialHasher;
pub use identity::{WalletIdentity, derive_identity};
pub use seed_phrase::{generate_seed_phrase, is_valid};
pub use signature::{personal_message_hash, recover_address, sign, verify};
