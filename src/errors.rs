use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which tripwire fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tripwire {
    /// The stored master public key no longer matches its HMAC.
    PublicKey,
    /// The raw vault record no longer matches its HMAC.
    SiteVault,
    /// The unlocked private key does not belong to the stored public key.
    MasterKeyMismatch,
}

impl fmt::Display for Tripwire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tripwire::PublicKey => "your master public key has changed",
            Tripwire::SiteVault => "your vault record has changed",
            Tripwire::MasterKeyMismatch => "the sealed master key does not match the public key",
        };
        f.write_str(label)
    }
}

/// Coarse error classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request; the vault is unchanged.
    InvalidInput,
    /// Wrong passphrase or corrupted/tampered ciphertext.
    DecryptionFailed,
    /// A tripwire fired or is still armed. Always fatal.
    IntegrityViolation,
    /// Reading or writing the vault directory failed.
    StorageError,
}

/// All errors that can occur in passvault.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Input errors ---
    #[error("An entry named '{0}' already exists")]
    DuplicateName(String),

    #[error("No entry named '{0}' in the vault")]
    EntryNotFound(String),

    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),

    #[error("Cannot satisfy {required} required character classes in {length} characters")]
    InfeasibleRequest { length: usize, required: usize },

    #[error("Password length {length} exceeds the maximum of {max}")]
    LengthTooLarge { length: usize, max: usize },

    #[error("Entry '{0}' cannot change between a credential and a file")]
    EntryKindMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Crypto errors ---
    #[error("Decryption failed — wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    // --- Integrity errors ---
    #[error("You are under attack! {0}. The vault is locked until the tripwire is cleared by hand.")]
    IntegrityViolation(Tripwire),

    #[error("Tripwire marker found at {0} — refusing to touch the vault until it is inspected and removed by hand")]
    TripwireActive(PathBuf),

    // --- Storage errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vault not found at {0} — run `passvault init` first")]
    VaultNotFound(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Audit error: {0}")]
    AuditError(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

impl PassVaultError {
    /// Map this error onto its reporting class.
    pub fn kind(&self) -> ErrorKind {
        use PassVaultError::*;
        match self {
            DuplicateName(_)
            | EntryNotFound(_)
            | InvalidEntryName(_)
            | InfeasibleRequest { .. }
            | LengthTooLarge { .. }
            | EntryKindMismatch(_)
            | InvalidInput(_)
            | VaultAlreadyExists(_)
            | PasswordMismatch
            | UserCancelled
            | CommandFailed(_)
            | ConfigError(_) => ErrorKind::InvalidInput,
            DecryptionFailed
            | EncryptionFailed(_)
            | KeyDerivationFailed(_)
            | RandomnessUnavailable(_) => ErrorKind::DecryptionFailed,
            IntegrityViolation(_) | TripwireActive(_) => ErrorKind::IntegrityViolation,
            Io(_)
            | VaultNotFound(_)
            | InvalidVaultFormat(_)
            | SerializationError(_)
            | AuditError(_)
            | SyncFailed(_) => ErrorKind::StorageError,
        }
    }
}

/// Convenience type alias for passvault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;
