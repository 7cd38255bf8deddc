//! Public-key authenticated encryption ("box") over X25519.
//!
//! Sender secret + recipient public key (or the mirror pair on the
//! opening side) agree on a shared secret, which HKDF-SHA256 expands into
//! an AES-256-GCM key bound to both public keys.  The payload is then
//! sealed with `seal_symmetric`, so the nonce handling is the same as for
//! the passphrase-sealed master key.
//!
//! Layout of a sealed box: [ 12-byte nonce | ciphertext + 16-byte tag ]

use aes_gcm::aead::OsRng;
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

use super::encryption::{open_symmetric, seal_symmetric};
use crate::errors::{PassVaultError, Result};

/// Domain separation label for the box key.
const BOX_INFO: &[u8] = b"passvault-box-v1";

const KEY_LEN: usize = 32;

/// A symmetric key agreed between one sender and one recipient.
///
/// Wiped from memory on drop.
pub struct BoxKey {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl BoxKey {
    /// Expand a raw X25519 shared secret into a box key.
    fn from_shared(
        shared: &SharedSecret,
        sender_public: &PublicKey,
        recipient_public: &PublicKey,
    ) -> Result<Self> {
        // An all-zero shared secret means one side supplied a low-order point.
        if !shared.was_contributory() {
            return Err(PassVaultError::InvalidInput(
                "public key is not a valid X25519 point".into(),
            ));
        }

        let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        hk.expand_multi_info(
            &[BOX_INFO, sender_public.as_bytes(), recipient_public.as_bytes()],
            &mut key[..],
        )
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

        Ok(Self { key })
    }

    /// Generate a throwaway sender keypair and agree with `recipient`.
    ///
    /// The secret half is consumed by the agreement and dropped before this
    /// function returns; only the public half and the box key leave it.
    pub fn ephemeral(recipient: &PublicKey) -> Result<(PublicKey, Self)> {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let sender_public = PublicKey::from(&secret);
        let shared = secret.diffie_hellman(recipient);
        let key = Self::from_shared(&shared, &sender_public, recipient)?;
        Ok((sender_public, key))
    }

    /// Agree on the sending side with a long-lived secret.
    pub fn for_sending(sender: &StaticSecret, recipient_public: &PublicKey) -> Result<Self> {
        let sender_public = PublicKey::from(sender);
        let shared = sender.diffie_hellman(recipient_public);
        Self::from_shared(&shared, &sender_public, recipient_public)
    }

    /// Agree on the receiving side.
    pub fn for_opening(sender_public: &PublicKey, recipient: &StaticSecret) -> Result<Self> {
        let recipient_public = PublicKey::from(recipient);
        let shared = recipient.diffie_hellman(sender_public);
        Self::from_shared(&shared, sender_public, &recipient_public)
    }

    /// Seal one message; a fresh nonce is drawn per call.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        seal_symmetric(&self.key[..], plaintext)
    }

    /// Authenticate and open one message.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        open_symmetric(&self.key[..], sealed)
    }
}

/// Seal `plaintext` from `sender_secret` to `recipient_public`.
pub fn seal_asymmetric(
    plaintext: &[u8],
    recipient_public: &PublicKey,
    sender_secret: &StaticSecret,
) -> Result<Vec<u8>> {
    BoxKey::for_sending(sender_secret, recipient_public)?.seal(plaintext)
}

/// Open a box sealed by `sender_public` for `recipient_secret`.
pub fn open_asymmetric(
    sealed: &[u8],
    sender_public: &PublicKey,
    recipient_secret: &StaticSecret,
) -> Result<Vec<u8>> {
    BoxKey::for_opening(sender_public, recipient_secret)
        .map_err(|_| PassVaultError::DecryptionFailed)?
        .open(sealed)
}
