//! Deterministic wallet identities.
//!
//! ```text
//! phrase ──BIP-39──▶ seed ──BIP-32 m/44'/60'/0'/0/{i}──▶ secp256k1 key
//!                                                           │
//!        address = keccak256(uncompressed pubkey[1..])[12..] ◀┘
//! ```

use bip32::{DerivationPath, XPrv};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use mockchain_types::{Address, Result, WalletError, constants::DERIVATION_PATH_PREFIX};
use tracing::debug;

use crate::{seed_phrase, signature};

/// An address together with the key that controls it.
///
/// Only the address is ever persisted; the key lives as long as this value.
#[derive(Clone)]
pub struct WalletIdentity {
    address: Address,
    key: SigningKey,
}

impl WalletIdentity {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Sign `message` as an Ethereum personal message.
    pub fn sign(&self, message: &str) -> Result<String> {
        signature::sign(message, &self.key)
    }
}

impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Derive the identity at `index` for `phrase`.
///
/// Fails with [`WalletError::InvalidSeedPhrase`] when the phrase does not
/// pass the word-list and checksum check.
pub fn derive_identity(phrase: &str, index: u32) -> Result<WalletIdentity> {
    let mnemonic = seed_phrase::parse(phrase)?;
    let seed = mnemonic.to_seed_normalized("");

    let path: DerivationPath = format!("{DERIVATION_PATH_PREFIX}/{index}")
        .parse()
        .map_err(|e: bip32::Error| WalletError::KeyDerivation(e.to_string()))?;
    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

    let key = xprv.private_key().clone();
    let address = address_of(key.verifying_key());
    debug!(index, address = %address, "Identity derived");
    Ok(WalletIdentity { address, key })
}

pub(crate) fn address_of(vk: &VerifyingKey) -> Address {
    let point = k256::PublicKey::from(vk).to_encoded_point(false);
    Address::from_public_key_body(&point.as_bytes()[1..])
}
