//! Cryptographic primitives for passvault.
//!
//! This module provides:
//! - AES-256-GCM sealing with internal nonces (`encryption`)
//! - Argon2id passphrase key derivation (`kdf`)
//! - X25519 public-key boxes (`sealbox`)
//! - The zeroizing master secret wrapper (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod sealbox;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal_symmetric, derive_key, ...};
pub use encryption::{open_symmetric, seal_symmetric};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use keys::MasterSecret;
pub use sealbox::{open_asymmetric, seal_asymmetric, BoxKey};
pub use x25519_dalek::PublicKey;
