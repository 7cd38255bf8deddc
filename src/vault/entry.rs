//! Vault entries and their sealing.
//!
//! Every entry is sealed from a one-time X25519 keypair to the master
//! public key.  Only the public half of the entry keypair is stored; the
//! private half lives inside `BoxKey::ephemeral` and is gone before
//! `seal_entry` returns.  Opening needs the master private key.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{BoxKey, MasterSecret, PublicKey};
use crate::errors::{PassVaultError, Result};

use super::format::{b64_key, b64_list, b64_opt};

/// Separates the group from the leaf in an entry name.
pub const GROUP_SEPARATOR: char = '/';

/// Longest accepted entry name, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Length of a file-entry blob token in hex characters.
pub const TOKEN_HEX_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Stored types
// ---------------------------------------------------------------------------

/// One record of `sites.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct VaultEntry {
    pub name: String,
    pub entry_public_key: [u8; 32],
    pub payload: SealedPayload,
}

/// What an entry seals: a credential or a file, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealedPayload {
    Credential {
        password: Vec<u8>,
        username: Option<Vec<u8>>,
        notes: Vec<Vec<u8>>,
    },
    /// The sealed bytes live in `files/<token>`.
    File { token: String },
}

impl VaultEntry {
    pub fn is_file(&self) -> bool {
        matches!(self.payload, SealedPayload::File { .. })
    }

    pub fn file_token(&self) -> Option<&str> {
        match &self.payload {
            SealedPayload::File { token } => Some(token),
            SealedPayload::Credential { .. } => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    pub fn leaf(&self) -> &str {
        split_name(&self.name).1
    }
}

/// Flat JSON shape of an entry.
#[derive(Serialize, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(with = "b64_key")]
    entry_public_key: [u8; 32],
    #[serde(default, with = "b64_opt", skip_serializing_if = "Option::is_none")]
    password_sealed: Option<Vec<u8>>,
    #[serde(default, with = "b64_opt", skip_serializing_if = "Option::is_none")]
    username_sealed: Option<Vec<u8>>,
    #[serde(default, with = "b64_list", skip_serializing_if = "Vec::is_empty")]
    notes_sealed: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
}

impl TryFrom<RawEntry> for VaultEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> std::result::Result<Self, Self::Error> {
        validate_name(&raw.name).map_err(|e| e.to_string())?;

        let payload = if raw.is_file {
            if raw.password_sealed.is_some()
                || raw.username_sealed.is_some()
                || !raw.notes_sealed.is_empty()
            {
                return Err(format!(
                    "entry '{}' is a file but also carries credential fields",
                    raw.name
                ));
            }
            let token = raw
                .file_name
                .ok_or_else(|| format!("file entry '{}' has no file_name", raw.name))?;
            if !is_valid_token(&token) {
                return Err(format!("file entry '{}' has a malformed file_name", raw.name));
            }
            SealedPayload::File { token }
        } else {
            if raw.file_name.is_some() {
                return Err(format!(
                    "entry '{}' has a file_name but is not a file",
                    raw.name
                ));
            }
            let password = raw
                .password_sealed
                .ok_or_else(|| format!("entry '{}' has no password_sealed", raw.name))?;
            SealedPayload::Credential {
                password,
                username: raw.username_sealed,
                notes: raw.notes_sealed,
            }
        };

        Ok(Self {
            name: raw.name,
            entry_public_key: raw.entry_public_key,
            payload,
        })
    }
}

impl From<VaultEntry> for RawEntry {
    fn from(entry: VaultEntry) -> Self {
        let mut raw = RawEntry {
            name: entry.name,
            entry_public_key: entry.entry_public_key,
            password_sealed: None,
            username_sealed: None,
            notes_sealed: Vec::new(),
            is_file: false,
            file_name: None,
        };
        match entry.payload {
            SealedPayload::Credential {
                password,
                username,
                notes,
            } => {
                raw.password_sealed = Some(password);
                raw.username_sealed = username;
                raw.notes_sealed = notes;
            }
            SealedPayload::File { token } => {
                raw.is_file = true;
                raw.file_name = Some(token);
            }
        }
        raw
    }
}

// ---------------------------------------------------------------------------
// Plaintext types
// ---------------------------------------------------------------------------

/// Plaintext credential fields, wiped on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    pub username: Option<String>,
    pub password: String,
    pub notes: Vec<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("notes", &self.notes.len())
            .finish()
    }
}

/// Plaintext content of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Credential(Credential),
    File(Zeroizing<Vec<u8>>),
}

impl EntryContent {
    pub fn is_file(&self) -> bool {
        matches!(self, EntryContent::File(_))
    }
}

/// An entry opened field by field.  A field that fails to open carries
/// its error instead of stopping the others.
#[derive(Debug)]
pub struct OpenedEntry {
    pub name: String,
    pub fields: OpenedFields,
}

#[derive(Debug)]
pub enum OpenedFields {
    Credential {
        username: Option<Result<String>>,
        password: Result<Zeroizing<String>>,
        notes: Vec<Result<String>>,
    },
    File {
        token: String,
        content: Result<Zeroizing<Vec<u8>>>,
    },
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Seal `content` under a brand new entry keypair.
///
/// For a file the sealed blob is returned next to the record, under a
/// fresh token; the caller stores it as `files/<token>`.
pub fn seal_entry(
    name: &str,
    master_public: &PublicKey,
    content: &EntryContent,
) -> Result<(VaultEntry, Option<Vec<u8>>)> {
    validate_name(name)?;
    let (entry_public, key) = BoxKey::ephemeral(master_public)?;

    let (payload, blob) = match content {
        EntryContent::Credential(cred) => {
            let password = key.seal(cred.password.as_bytes())?;
            let username = cred
                .username
                .as_deref()
                .map(|u| key.seal(u.as_bytes()))
                .transpose()?;
            let notes = cred
                .notes
                .iter()
                .map(|n| key.seal(n.as_bytes()))
                .collect::<Result<Vec<_>>>()?;
            (
                SealedPayload::Credential {
                    password,
                    username,
                    notes,
                },
                None,
            )
        }
        EntryContent::File(bytes) => (
            SealedPayload::File { token: new_token()? },
            Some(key.seal(bytes)?),
        ),
    };

    Ok((
        VaultEntry {
            name: name.to_string(),
            entry_public_key: entry_public.to_bytes(),
            payload,
        },
        blob,
    ))
}

/// Open every field of `entry`, failing on the first bad one.
///
/// `load_blob` is asked for the sealed bytes of a file entry.
pub fn open_entry(
    master: &MasterSecret,
    entry: &VaultEntry,
    load_blob: impl FnOnce(&str) -> Result<Vec<u8>>,
) -> Result<EntryContent> {
    let key = opening_key(master, entry)?;
    match &entry.payload {
        SealedPayload::Credential {
            password,
            username,
            notes,
        } => Ok(EntryContent::Credential(Credential {
            username: username
                .as_deref()
                .map(|u| open_text(&key, u))
                .transpose()?,
            password: open_text(&key, password)?,
            notes: notes
                .iter()
                .map(|n| open_text(&key, n))
                .collect::<Result<Vec<_>>>()?,
        })),
        SealedPayload::File { token } => {
            let sealed = load_blob(token)?;
            Ok(EntryContent::File(Zeroizing::new(key.open(&sealed)?)))
        }
    }
}

/// Open every field of `entry` independently.
///
/// Failures are logged at warn level and kept in the result so the
/// caller can skip just that field.
pub fn open_fields(
    master: &MasterSecret,
    entry: &VaultEntry,
    load_blob: impl FnOnce(&str) -> Result<Vec<u8>>,
) -> OpenedEntry {
    let key = opening_key(master, entry);
    let open = |field: &str, sealed: &[u8]| -> Result<String> {
        let result = key
            .as_ref()
            .map_err(|_| PassVaultError::DecryptionFailed)
            .and_then(|k| open_text(k, sealed));
        if let Err(e) = &result {
            warn!("skipping {field} of '{}': {e}", entry.name);
        }
        result
    };

    let fields = match &entry.payload {
        SealedPayload::Credential {
            password,
            username,
            notes,
        } => OpenedFields::Credential {
            username: username.as_deref().map(|u| open("username", u)),
            password: open("password", password).map(Zeroizing::new),
            notes: notes.iter().map(|n| open("note", n)).collect(),
        },
        SealedPayload::File { token } => {
            let content = key
                .as_ref()
                .map_err(|_| PassVaultError::DecryptionFailed)
                .and_then(|k| {
                    let sealed = load_blob(token)?;
                    k.open(&sealed).map(Zeroizing::new)
                });
            if let Err(e) = &content {
                warn!("skipping file content of '{}': {e}", entry.name);
            }
            OpenedFields::File {
                token: token.clone(),
                content,
            }
        }
    };

    OpenedEntry {
        name: entry.name.clone(),
        fields,
    }
}

fn opening_key(master: &MasterSecret, entry: &VaultEntry) -> Result<BoxKey> {
    BoxKey::for_opening(&PublicKey::from(entry.entry_public_key), master.as_static())
        .map_err(|_| PassVaultError::DecryptionFailed)
}

fn open_text(key: &BoxKey, sealed: &[u8]) -> Result<String> {
    let bytes = key.open(sealed)?;
    String::from_utf8(bytes).map_err(|e| {
        let mut bad = e.into_bytes();
        bad.zeroize();
        PassVaultError::InvalidVaultFormat("sealed field is not valid UTF-8".into())
    })
}

// ---------------------------------------------------------------------------
// Names and tokens
// ---------------------------------------------------------------------------

/// Check that `name` can be stored.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PassVaultError::InvalidEntryName(
            "name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(PassVaultError::InvalidEntryName(format!(
            "name cannot exceed {MAX_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(PassVaultError::InvalidEntryName(
            "name cannot contain control characters".into(),
        ));
    }
    if name.trim() != name {
        return Err(PassVaultError::InvalidEntryName(
            "name cannot start or end with whitespace".into(),
        ));
    }
    Ok(())
}

/// Split `name` into `(group, leaf)`.
///
/// The group is the text before the first separator when that separator
/// is not the first character.  `"/x"` has no group and leaf `"x"`.
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.find(GROUP_SEPARATOR) {
        Some(0) => (None, &name[1..]),
        Some(i) => (Some(&name[..i]), &name[i + 1..]),
        None => (None, name),
    }
}

/// Fresh random blob token: 16 bytes, hex encoded.
pub fn new_token() -> Result<String> {
    use rand::TryRngCore;

    let mut bytes = [0u8; TOKEN_HEX_LEN / 2];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| PassVaultError::RandomnessUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Tokens double as file names, so only lowercase hex is accepted.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
