//! Seed-phrase credentials.
//!
//! The stored credential is an Argon2id PHC string computed over the
//! SHA-256 hex digest of the phrase with a random 16-byte salt. The phrase
//! itself is never stored.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use mockchain_types::{CredentialConfig, Result, WalletError};
use sha2::{Digest, Sha256};
use tracing::warn;

const SALT_LEN: usize = 16;

/// Hashes and verifies seed-phrase credentials.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &CredentialConfig) -> Result<Self> {
        let params = Params::new(config.m_cost_kib, config.t_cost, config.p_cost, None)
            .map_err(|e| WalletError::Configuration(format!("invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Produce a fresh salted credential for `phrase`.
    pub fn hash(&self, phrase: &str) -> Result<String> {
        let salt_bytes: [u8; SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| WalletError::CredentialHash(e.to_string()))?;
        let digest = phrase_digest(phrase);
        let hash = self
            .argon2()
            .hash_password(digest.as_bytes(), &salt)
            .map_err(|e| WalletError::CredentialHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// `true` only if `stored` is a well-formed hash of `phrase`.
    pub fn verify(&self, phrase: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            warn!("Stored credential is not a PHC string");
            return false;
        };
        let digest = phrase_digest(phrase);
        self.argon2()
            .verify_password(digest.as_bytes(), &parsed)
            .is_ok()
    }
}

fn phrase_digest(phrase: &str) -> String {
    hex::encode(Sha256::digest(phrase.trim().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "test test test test test test test test test test test junk";

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(&CredentialConfig::insecure_fast()).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let h = hasher();
        let stored = h.hash(PHRASE).unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(h.verify(PHRASE, &stored));
    }

    #[test]
    fn wrong_phrase_rejected() {
        let h = hasher();
        let stored = h.hash(PHRASE).unwrap();
        assert!(!h.verify(&PHRASE.replace("junk", "test"), &stored));
    }

    #[test]
    fn salted_hashes_differ() {
        let h = hasher();
        assert_ne!(h.hash(PHRASE).unwrap(), h.hash(PHRASE).unwrap());
    }

    #[test]
    fn hash_never_contains_phrase() {
        let stored = hasher().hash(PHRASE).unwrap();
        assert!(!stored.contains("junk"));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        let h = hasher();
        assert!(!h.verify(PHRASE, ""));
        assert!(!h.verify(PHRASE, "$2b$12$notargon"));
        assert!(!h.verify(PHRASE, "$argon2id$v=19$garbage"));
    }

    #[test]
    fn zero_costs_rejected() {
        let config = CredentialConfig {
            m_cost_kib: 0,
            t_cost: 0,
            p_cost: 0,
        };
        assert!(matches!(
            CredentialHasher::new(&config),
            Err(WalletError::Configuration(_))
        ));
    }
}
