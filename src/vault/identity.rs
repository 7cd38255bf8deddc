//! The master identity record (`config.json`).
//!
//! Holds the master public key in the clear, the master private key
//! sealed under a passphrase-derived key, the three per-purpose salts and
//! the two tripwire HMACs.  Nothing in here can be used to open an entry
//! without the passphrase.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::kdf::SALT_LEN;
use crate::crypto::{
    derive_key, generate_salt, open_symmetric, seal_symmetric, Argon2Params, MasterSecret,
    PublicKey,
};
use crate::errors::{PassVaultError, Result, Tripwire};
use crate::integrity;

use super::format::{self, b64, b64_key, CURRENT_VERSION};

/// Everything needed to unlock the master key and check the tripwires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterIdentity {
    /// Record format version.
    pub version: u8,

    /// When the vault was initialized.
    pub created_at: DateTime<Utc>,

    /// Argon2id cost used for every passphrase-derived key.
    pub kdf: Argon2Params,

    #[serde(with = "b64_key")]
    pub master_public_key: [u8; 32],

    /// nonce || AES-256-GCM(pass key, master private key)
    #[serde(with = "b64")]
    pub master_private_key_sealed: Vec<u8>,

    #[serde(with = "b64_key")]
    pub pass_key_salt: [u8; SALT_LEN],

    #[serde(with = "b64_key")]
    pub hmac_salt: [u8; SALT_LEN],

    #[serde(with = "b64_key")]
    pub site_hmac_salt: [u8; SALT_LEN],

    /// HMAC-SHA256(hmac_salt key, master_public_key)
    #[serde(with = "b64")]
    pub public_key_hmac: Vec<u8>,

    /// HMAC-SHA256(site_hmac_salt key, raw sites.json), empty until the
    /// first baseline.
    #[serde(with = "b64")]
    pub vault_hmac: Vec<u8>,
}

impl MasterIdentity {
    /// Create a fresh master identity protected by `passphrase`.
    ///
    /// `vault_hmac` is left empty; the caller baselines it once the vault
    /// record exists.
    pub fn initialize(passphrase: &[u8], params: &Argon2Params) -> Result<Self> {
        params.validate()?;

        let master = MasterSecret::generate();
        let pass_key_salt = generate_salt()?;
        let hmac_salt = generate_salt()?;
        let site_hmac_salt = generate_salt()?;
        ensure_distinct(&pass_key_salt, &hmac_salt, &site_hmac_salt)
            .map_err(|_| PassVaultError::RandomnessUnavailable("salts repeated".into()))?;

        let pass_key = derive_key(passphrase, &pass_key_salt, params)?;
        let master_private_key_sealed = seal_symmetric(&pass_key[..], &master.to_bytes()[..])?;

        let master_public_key = master.public_key().to_bytes();
        let public_key_hmac =
            integrity::keyed_hmac(passphrase, &hmac_salt, params, &master_public_key)?;

        Ok(Self {
            version: CURRENT_VERSION,
            created_at: Utc::now(),
            kdf: *params,
            master_public_key,
            master_private_key_sealed,
            pass_key_salt,
            hmac_salt,
            site_hmac_salt,
            public_key_hmac,
            vault_hmac: Vec::new(),
        })
    }

    /// Recover the master private key.
    ///
    /// A wrong passphrase and a corrupted sealed key are reported the same
    /// way.  A key that opens but does not belong to `master_public_key` is
    /// an integrity violation.
    pub fn unlock(&self, passphrase: &[u8]) -> Result<MasterSecret> {
        let pass_key = derive_key(passphrase, &self.pass_key_salt, &self.kdf)?;

        let mut plain = Zeroizing::new(
            open_symmetric(&pass_key[..], &self.master_private_key_sealed).map_err(|e| {
                debug!("master key did not open: {e}");
                PassVaultError::DecryptionFailed
            })?,
        );
        let master = MasterSecret::from_bytes(&mut plain).map_err(|e| {
            debug!("sealed master key has the wrong length: {e}");
            PassVaultError::DecryptionFailed
        })?;

        if !master.matches(&self.public_key()) {
            return Err(PassVaultError::IntegrityViolation(
                Tripwire::MasterKeyMismatch,
            ));
        }
        Ok(master)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.master_public_key)
    }

    /// Read and validate `config.json` from a vault directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let bytes = format::read_record(&format::config_path(dir))?;
        let identity: Self = format::from_record_bytes(&bytes, format::CONFIG_FILE)?;
        identity.validate()?;
        Ok(identity)
    }

    /// Atomically write `config.json` into a vault directory.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let bytes = format::to_record_bytes(self)?;
        format::write_atomic(&format::config_path(dir), &bytes)
    }

    fn validate(&self) -> Result<()> {
        if self.version != CURRENT_VERSION {
            return Err(PassVaultError::InvalidVaultFormat(format!(
                "unsupported config version {} (expected {CURRENT_VERSION})",
                self.version
            )));
        }
        self.kdf.validate()?;
        ensure_distinct(&self.pass_key_salt, &self.hmac_salt, &self.site_hmac_salt)?;
        if self.public_key_hmac.len() != integrity::HMAC_LEN {
            return Err(PassVaultError::InvalidVaultFormat(
                "public_key_hmac has the wrong length".into(),
            ));
        }
        if !self.vault_hmac.is_empty() && self.vault_hmac.len() != integrity::HMAC_LEN {
            return Err(PassVaultError::InvalidVaultFormat(
                "vault_hmac has the wrong length".into(),
            ));
        }
        Ok(())
    }
}

/// Every derived key must come from its own salt.
fn ensure_distinct(a: &[u8], b: &[u8], c: &[u8]) -> Result<()> {
    if a == b || a == c || b == c {
        return Err(PassVaultError::InvalidVaultFormat(
            "config salts must be distinct".into(),
        ));
    }
    Ok(())
}
