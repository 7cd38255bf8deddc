//! Master keypair handling.
//!
//! The master private key only ever exists in memory inside a
//! `MasterSecret`, which wipes it on drop.  Entry keypairs never get a
//! wrapper at all: they are created and consumed inside
//! `BoxKey::ephemeral`.

use aes_gcm::aead::OsRng;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{PassVaultError, Result};

/// Length of X25519 public and private keys.
pub const KEY_LEN: usize = 32;

/// The unlocked master private key.
pub struct MasterSecret {
    secret: StaticSecret,
}

impl MasterSecret {
    /// Generate a fresh master keypair.
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    /// Rebuild from raw bytes recovered from the sealed config field.
    ///
    /// The input buffer is wiped after copying.
    pub fn from_bytes(bytes: &mut [u8]) -> Result<Self> {
        let result = <[u8; KEY_LEN]>::try_from(&*bytes)
            .map(|mut raw| {
                let secret = StaticSecret::from(raw);
                raw.zeroize();
                Self { secret }
            })
            .map_err(|_| PassVaultError::DecryptionFailed);
        bytes.zeroize();
        result
    }

    /// Recompute the public half by scalar base multiplication.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.secret)
    }

    /// Raw private key bytes, for sealing under the passphrase key.
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    pub(crate) fn as_static(&self) -> &StaticSecret {
        &self.secret
    }

    /// Check that this secret belongs to `expected`, in constant time.
    pub fn matches(&self, expected: &PublicKey) -> bool {
        let actual = self.public_key();
        actual.as_bytes()[..].ct_eq(&expected.as_bytes()[..]).into()
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}
