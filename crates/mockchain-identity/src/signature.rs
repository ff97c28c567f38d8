//! Ethereum personal-message signatures (`personal_sign`).
//!
//! Signatures travel as `0x` + 130 hex chars: `r || s || v` with
//! `v ∈ {27, 28}`. Recovery ids `0`/`1` are also accepted on input.
//!
//! Verification fails closed: every malformed input yields `false` or
//! `None`, never an error.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use mockchain_types::{Address, Result, WalletError};
use sha3::{Digest, Keccak256};

use crate::identity::address_of;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";
const SIGNATURE_LEN: usize = 65;

/// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Sign `message` with a recoverable secp256k1 signature.
pub fn sign(message: &str, key: &SigningKey) -> Result<String> {
    let hash = personal_message_hash(message);
    let (sig, recid) = key
        .sign_prehash_recoverable(&hash)
        .map_err(|e| WalletError::Internal(format!("signing failed: {e}")))?;

    let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
    bytes.extend_from_slice(&sig.to_bytes());
    bytes.push(27 + recid.to_byte());
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_address(message: &str, signature: &str) -> Option<Address> {
    let hex_part = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(hex_part).ok()?;
    if bytes.len() != SIGNATURE_LEN {
        return None;
    }

    let v = match bytes[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        _ => return None,
    };
    let recid = RecoveryId::from_byte(v)?;
    let sig = Signature::from_slice(&bytes[..64]).ok()?;

    let hash = personal_message_hash(message);
    let vk = VerifyingKey::recover_from_prehash(&hash, &sig, recid).ok()?;
    Some(address_of(&vk))
}

/// Does `signature` over `message` recover to `claimed`?
pub fn verify(message: &str, signature: &str, claimed: &Address) -> bool {
    recover_address(message, signature).is_some_and(|signer| signer == *claimed)
}
