//! Passphrase-based key derivation using Argon2id.
//!
//! Every key the vault derives from the master passphrase (unlock key,
//! public-key HMAC key, vault HMAC key) goes through `derive_key` with its
//! own salt.  The cost parameters are written into the config record at
//! initialization, so the same vault always derives with the same cost on
//! every platform.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::errors::{PassVaultError, Result};

/// Length of every salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2id cost parameters.
///
/// Stored verbatim in the `kdf` object of `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject parameters that would make the KDF dangerously cheap.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(PassVaultError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(PassVaultError::KeyDerivationFailed(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(PassVaultError::KeyDerivationFailed(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Derive a 32-byte key from a passphrase and salt.
///
/// Deterministic: the same passphrase + salt + params always produce the
/// same key.  The key is wiped when the returned wrapper drops.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| PassVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, &mut key[..])
        .map_err(|e| {
            PassVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}"))
        })?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| PassVaultError::RandomnessUnavailable(e.to_string()))?;
    Ok(salt)
}
