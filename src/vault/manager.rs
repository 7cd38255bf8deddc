//! High-level vault operations used by CLI commands.
//!
//! `VaultManager` ties the master identity, the entry list and the
//! tripwires together so the command layer can work with calls like
//! `manager.insert_credential("bank.com", &cred)`.
//!
//! Only reading an entry back needs the master private key.  Inserting
//! needs nothing but the public key, so no passphrase is asked for.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::crypto::{Argon2Params, MasterSecret};
use crate::errors::{PassVaultError, Result};
use crate::integrity::{self, IntegrityVerifier};

use super::entry::{
    self, validate_name, Credential, EntryContent, OpenedEntry, VaultEntry,
};
use super::format;
use super::identity::MasterIdentity;
use super::store::{Group, Query, VaultStore};

/// The main vault handle.  Create one with `VaultManager::init` or
/// `VaultManager::open`.
pub struct VaultManager {
    dir: PathBuf,
    identity: MasterIdentity,
    store: VaultStore,
}

impl VaultManager {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new vault in `dir`.
    ///
    /// Writes an empty vault record, then the master identity with its
    /// vault HMAC already baselined over that record, so the tripwires
    /// pass straight after initialization.
    pub fn init(dir: &Path, passphrase: &[u8], params: &Argon2Params) -> Result<Self> {
        let config = format::config_path(dir);
        if config.exists() {
            return Err(PassVaultError::VaultAlreadyExists(dir.to_path_buf()));
        }
        create_private_dir(dir)?;
        integrity::check_tripwire(dir)?;

        let mut identity = MasterIdentity::initialize(passphrase, params)?;
        let store = VaultStore::create(dir)?;
        identity.vault_hmac =
            integrity::refresh_site_vault_hmac(passphrase, &identity, store.raw_bytes())?;
        identity.save(dir)?;

        info!("initialized vault at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            identity,
            store,
        })
    }

    /// Open an existing vault.  No passphrase is needed.
    ///
    /// Refuses to open while a tripwire marker is present.
    pub fn open(dir: &Path) -> Result<Self> {
        integrity::check_tripwire(dir)?;
        let config = format::config_path(dir);
        if !config.exists() {
            return Err(PassVaultError::VaultNotFound(dir.to_path_buf()));
        }
        let identity = MasterIdentity::load(dir)?;
        let store = VaultStore::load(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            identity,
            store,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn identity(&self) -> &MasterIdentity {
        &self.identity
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    pub fn entries(&self) -> &[VaultEntry] {
        self.store.entries()
    }

    // ------------------------------------------------------------------
    // Unlock
    // ------------------------------------------------------------------

    /// Recover the master private key.
    ///
    /// A key that opens but does not match the stored public key trips
    /// the marker before the error is returned.
    pub fn unlock(&self, passphrase: &[u8]) -> Result<MasterSecret> {
        match self.identity.unlock(passphrase) {
            Err(PassVaultError::IntegrityViolation(tripwire)) => {
                Err(integrity::raise(&self.dir, tripwire))
            }
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn query(&self, query: &Query) -> Vec<Group<'_>> {
        self.store.query(query)
    }

    pub fn select(&self, query: &Query) -> Vec<&VaultEntry> {
        self.store.select(query)
    }

    pub fn find_one(&self, name: &str) -> Option<&VaultEntry> {
        self.store.find_one(name)
    }

    fn require(&self, name: &str) -> Result<&VaultEntry> {
        self.store
            .find_one(name)
            .ok_or_else(|| PassVaultError::EntryNotFound(name.to_string()))
    }

    /// Open every field of `entry`, failing on the first bad one.
    pub fn open_entry(&self, master: &MasterSecret, entry: &VaultEntry) -> Result<EntryContent> {
        entry::open_entry(master, entry, |token| self.store.read_blob(token))
    }

    /// Open every field of `entry` independently.
    pub fn open_fields(&self, master: &MasterSecret, entry: &VaultEntry) -> OpenedEntry {
        entry::open_fields(master, entry, |token| self.store.read_blob(token))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Seal and append a credential entry.
    pub fn insert_credential(&mut self, name: &str, credential: &Credential) -> Result<()> {
        self.insert(name, &EntryContent::Credential(credential.clone()))
    }

    /// Seal `bytes` into a blob and append a file entry pointing at it.
    pub fn insert_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.insert(
            name,
            &EntryContent::File(zeroize::Zeroizing::new(bytes.to_vec())),
        )
    }

    fn insert(&mut self, name: &str, content: &EntryContent) -> Result<()> {
        integrity::check_tripwire(&self.dir)?;
        validate_name(name)?;
        if self.store.contains(name) {
            return Err(PassVaultError::DuplicateName(name.to_string()));
        }

        let (sealed, blob) = entry::seal_entry(name, &self.identity.public_key(), content)?;
        let token = self.write_new_blob(&sealed, blob)?;

        if let Err(e) = self.store.insert(sealed) {
            self.discard_blob(token.as_deref());
            return Err(e);
        }
        info!("inserted '{name}'");
        Ok(())
    }

    /// Replace the content of `name`, sealed under a brand-new entry
    /// keypair.  A credential stays a credential and a file stays a file.
    pub fn edit(&mut self, name: &str, content: &EntryContent) -> Result<()> {
        integrity::check_tripwire(&self.dir)?;
        let current = self.require(name)?;
        if current.is_file() != content.is_file() {
            return Err(PassVaultError::EntryKindMismatch(name.to_string()));
        }
        self.reseal(name, name, content)?;
        info!("edited '{name}'");
        Ok(())
    }

    /// Move `name` to `new_name`, re-sealing under a brand-new entry
    /// keypair.
    pub fn rename(&mut self, master: &MasterSecret, name: &str, new_name: &str) -> Result<()> {
        integrity::check_tripwire(&self.dir)?;
        validate_name(new_name)?;
        if name != new_name && self.store.contains(new_name) {
            return Err(PassVaultError::DuplicateName(new_name.to_string()));
        }
        let content = self.open_entry(master, self.require(name)?)?;
        self.reseal(name, new_name, &content)?;
        info!("renamed '{name}' to '{new_name}'");
        Ok(())
    }

    /// Delete the entry and, for a file entry, its blob.
    ///
    /// The blob is moved aside first and only deleted once the record no
    /// longer points at it; if the record write fails it is put back.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        integrity::check_tripwire(&self.dir)?;
        let token = self.require(name)?.file_token().map(String::from);

        let staged = match token.as_deref() {
            Some(token) => match self.store.stage_blob(token) {
                Ok(path) => Some(path),
                Err(PassVaultError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("blob of '{name}' was already missing");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        if let Err(e) = self.store.remove(name) {
            if let (Some(staged), Some(token)) = (&staged, token.as_deref()) {
                if let Err(restore) = self.store.restore_blob(staged, token) {
                    warn!("could not restore blob of '{name}': {restore}");
                }
            }
            return Err(e);
        }

        if let Some(staged) = staged {
            if let Err(e) = fs::remove_file(&staged) {
                warn!("could not delete blob {}: {e}", staged.display());
            }
        }
        info!("removed '{name}'");
        Ok(())
    }

    fn reseal(&mut self, name: &str, new_name: &str, content: &EntryContent) -> Result<()> {
        let old_token = self.require(name)?.file_token().map(String::from);

        let (sealed, blob) = entry::seal_entry(new_name, &self.identity.public_key(), content)?;
        let new_token = self.write_new_blob(&sealed, blob)?;

        if let Err(e) = self.store.replace(name, sealed) {
            self.discard_blob(new_token.as_deref());
            return Err(e);
        }
        self.discard_blob(old_token.as_deref());
        Ok(())
    }

    fn write_new_blob(&self, sealed: &VaultEntry, blob: Option<Vec<u8>>) -> Result<Option<String>> {
        match (sealed.file_token(), blob) {
            (Some(token), Some(blob)) => {
                self.store.write_blob(token, &blob)?;
                Ok(Some(token.to_string()))
            }
            _ => Ok(None),
        }
    }

    fn discard_blob(&self, token: Option<&str>) {
        if let Some(token) = token {
            if let Err(e) = self.store.remove_blob(token) {
                warn!("could not delete blob {token}: {e}");
            }
        }
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Run both tripwire checks against the vault as it is on disk now.
    ///
    /// Meant to run right after content arrived from a sync source.
    pub fn verify_after_sync(&self, passphrase: &[u8]) -> Result<()> {
        let mut verifier = IntegrityVerifier::new(&self.dir, &self.identity);
        verifier.verify_all(passphrase, self.store.raw_bytes())
    }

    /// Re-baseline `vault_hmac` over the current vault record.
    ///
    /// The passphrase must unlock the vault and the public key tripwire
    /// must hold, so a swapped key is never re-baselined.
    pub fn refresh_integrity(&mut self, passphrase: &[u8]) -> Result<()> {
        integrity::check_tripwire(&self.dir)?;
        self.unlock(passphrase)?;
        IntegrityVerifier::new(&self.dir, &self.identity).verify_public_key(passphrase)?;

        self.identity.vault_hmac = integrity::refresh_site_vault_hmac(
            passphrase,
            &self.identity,
            self.store.raw_bytes(),
        )?;
        self.identity.save(&self.dir)?;
        info!("vault HMAC refreshed");
        Ok(())
    }
}

/// Create the vault directory, owner-only on Unix.
fn create_private_dir(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        if !dir.exists() {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(dir)?;
        }
    }

    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;

    Ok(())
}
