//! AES-256-GCM authenticated encryption with internally managed nonces.
//!
//! Each call to `seal_symmetric` draws a fresh random 12-byte nonce from
//! the OS CSPRNG and prepends it to the ciphertext.  Callers never see or
//! choose a nonce, so they cannot reuse one.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{PassVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Seal `plaintext` under a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn seal_symmetric(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| PassVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Open data that was produced by `seal_symmetric`.
///
/// Every failure (short input, bad key, failed tag check) collapses into
/// the same `DecryptionFailed` error.
pub fn open_symmetric(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(PassVaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PassVaultError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| PassVaultError::DecryptionFailed)
}
