//! BIP-39 seed phrases.

use bip39::{Language, Mnemonic};
use mockchain_types::{Result, WalletError, constants::SEED_ENTROPY_BYTES};

/// Generate a fresh 12-word English mnemonic from 128 bits of entropy.
pub fn generate_seed_phrase() -> Result<String> {
    let entropy: [u8; SEED_ENTROPY_BYTES] = rand::random();
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::Internal(format!("mnemonic generation: {e}")))?;
    Ok(mnemonic.to_string())
}

/// Word-list membership and checksum check.
pub fn is_valid(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

pub(crate) fn parse(phrase: &str) -> Result<Mnemonic> {
    Mnemonic::parse_in_normalized(Language::English, phrase.trim())
        .map_err(|_| WalletError::InvalidSeedPhrase)
}
