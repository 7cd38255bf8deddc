//! Sync tripwires.
//!
//! Two HMACs guard a vault that travels through an untrusted channel:
//!
//! - `public_key_hmac` over the master public key, keyed from `hmac_salt`
//! - `vault_hmac` over the raw bytes of `sites.json`, keyed from
//!   `site_hmac_salt`
//!
//! Both keys are derived from the passphrase, so whoever swaps the public
//! key or edits the vault record cannot recompute a matching HMAC.  The
//! public key is always checked first; only then does the vault HMAC mean
//! anything.
//!
//! A mismatch drops a `TRIPWIRE` marker into the vault directory.  Every
//! later open refuses to run until a human has looked at the vault and
//! deleted the marker by hand.

use std::fs;
use std::path::Path;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, info};

use crate::crypto::{derive_key, Argon2Params};
use crate::errors::{PassVaultError, Result, Tripwire};
use crate::vault::format;
use crate::vault::MasterIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag.
pub const HMAC_LEN: usize = 32;

// ---------------------------------------------------------------------------
// HMAC primitives
// ---------------------------------------------------------------------------

/// Compute HMAC-SHA256 over `data`.
pub fn compute_hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Check `expected` against HMAC-SHA256 over `data`.
///
/// `verify_slice` compares in constant time.
fn hmac_matches(key: &[u8], data: &[u8], expected: &[u8]) -> Result<bool> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.verify_slice(expected).is_ok())
}

/// Derive an HMAC key from `passphrase` + `salt` and tag `data` with it.
pub fn keyed_hmac(
    passphrase: &[u8],
    salt: &[u8],
    params: &Argon2Params,
    data: &[u8],
) -> Result<Vec<u8>> {
    let key = derive_key(passphrase, salt, params)?;
    compute_hmac(&key[..], data)
}

/// Recompute `vault_hmac` over the current, honest vault bytes.
///
/// Called before pushing, so the next pull has a fresh baseline.
pub fn refresh_site_vault_hmac(
    passphrase: &[u8],
    identity: &MasterIdentity,
    vault_bytes: &[u8],
) -> Result<Vec<u8>> {
    keyed_hmac(
        passphrase,
        &identity.site_hmac_salt,
        &identity.kdf,
        vault_bytes,
    )
}

// ---------------------------------------------------------------------------
// Tripwire marker
// ---------------------------------------------------------------------------

/// Write the marker and log the trip.
pub fn trip(dir: &Path, tripwire: Tripwire) -> Result<()> {
    error!("tripwire fired in {}: {tripwire}", dir.display());
    let body = format!(
        "tripwire: {tripwire}\ntripped_at: {}\n\nInspect the vault, then delete this file by hand.\n",
        Utc::now().to_rfc3339()
    );
    format::write_private(&format::tripwire_path(dir), body.as_bytes())
}

/// Trip the marker and hand back the violation to return.
///
/// A marker that cannot be written is logged; the violation is still
/// reported.
pub fn raise(dir: &Path, tripwire: Tripwire) -> PassVaultError {
    if let Err(e) = trip(dir, tripwire) {
        error!(
            "could not write tripwire marker in {}: {e}",
            dir.display()
        );
    }
    PassVaultError::IntegrityViolation(tripwire)
}

/// Refuse to continue while the marker is present.
pub fn check_tripwire(dir: &Path) -> Result<()> {
    let marker = format::tripwire_path(dir);
    if marker.exists() {
        return Err(PassVaultError::TripwireActive(marker));
    }
    Ok(())
}

/// Contents of the marker, if any.
pub fn tripwire_reason(dir: &Path) -> Option<String> {
    fs::read_to_string(format::tripwire_path(dir)).ok()
}

// ---------------------------------------------------------------------------
// Verifier state machine
// ---------------------------------------------------------------------------

/// Progress of one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityState {
    Unverified,
    PubKeyChecked,
    FullyVerified,
    /// Terminal.  The marker has been written.
    Compromised(Tripwire),
}

/// Runs the two tripwire checks, in order, against one vault directory.
pub struct IntegrityVerifier<'a> {
    dir: &'a Path,
    identity: &'a MasterIdentity,
    state: IntegrityState,
}

impl<'a> IntegrityVerifier<'a> {
    pub fn new(dir: &'a Path, identity: &'a MasterIdentity) -> Self {
        Self {
            dir,
            identity,
            state: IntegrityState::Unverified,
        }
    }

    pub fn state(&self) -> IntegrityState {
        self.state
    }

    /// Check `public_key_hmac` against the stored master public key.
    pub fn verify_public_key(&mut self, passphrase: &[u8]) -> Result<()> {
        match self.state {
            IntegrityState::Compromised(t) => return Err(PassVaultError::IntegrityViolation(t)),
            IntegrityState::PubKeyChecked | IntegrityState::FullyVerified => return Ok(()),
            IntegrityState::Unverified => {}
        }

        let key = derive_key(passphrase, &self.identity.hmac_salt, &self.identity.kdf)?;
        if !hmac_matches(
            &key[..],
            &self.identity.master_public_key,
            &self.identity.public_key_hmac,
        )? {
            return self.compromise(Tripwire::PublicKey);
        }

        self.state = IntegrityState::PubKeyChecked;
        Ok(())
    }

    /// Check `vault_hmac` against the raw vault record bytes.
    ///
    /// The public key must have been checked first.
    pub fn verify_site_vault(&mut self, passphrase: &[u8], vault_bytes: &[u8]) -> Result<()> {
        match self.state {
            IntegrityState::Compromised(t) => return Err(PassVaultError::IntegrityViolation(t)),
            IntegrityState::Unverified => {
                return Err(PassVaultError::InvalidInput(
                    "the master public key must be verified before the vault record".into(),
                ))
            }
            IntegrityState::PubKeyChecked | IntegrityState::FullyVerified => {}
        }

        let key = derive_key(
            passphrase,
            &self.identity.site_hmac_salt,
            &self.identity.kdf,
        )?;
        if !hmac_matches(&key[..], vault_bytes, &self.identity.vault_hmac)? {
            return self.compromise(Tripwire::SiteVault);
        }

        self.state = IntegrityState::FullyVerified;
        info!("integrity verified for {}", self.dir.display());
        Ok(())
    }

    /// Both checks in order.
    pub fn verify_all(&mut self, passphrase: &[u8], vault_bytes: &[u8]) -> Result<()> {
        self.verify_public_key(passphrase)?;
        self.verify_site_vault(passphrase, vault_bytes)
    }

    fn compromise(&mut self, tripwire: Tripwire) -> Result<()> {
        self.state = IntegrityState::Compromised(tripwire);
        Err(raise(self.dir, tripwire))
    }
}
