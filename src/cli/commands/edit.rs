//! `passvault edit` — replace the content of an entry.
//!
//! The entry is always re-sealed under a brand-new entry keypair.  For a
//! credential, fields not given on the command line keep their current
//! value, except the password, which is re-entered or regenerated.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::commands::{commit, requested_length};
use crate::cli::output;
use crate::cli::{non_empty, prompt_passphrase, read_entry_password, vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::generator::{self, CharClass};
use crate::vault::{Credential, EntryContent, VaultManager};

/// Arguments of `edit`, straight from the parser.
pub struct EditArgs<'a> {
    pub name: &'a str,
    pub file: Option<&'a Path>,
    pub generate: Option<Option<i64>>,
    pub username: Option<&'a str>,
    pub notes: &'a [String],
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, args: &EditArgs<'_>) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let mut manager = VaultManager::open(&dir)?;

    let entry = manager
        .find_one(args.name)
        .ok_or_else(|| PassVaultError::EntryNotFound(args.name.to_string()))?;

    let (content, message) = if entry.is_file() {
        let path = args.file.ok_or_else(|| {
            PassVaultError::InvalidInput(format!(
                "'{}' is a file entry; pass --file <PATH> with the new contents",
                args.name
            ))
        })?;
        let bytes = Zeroizing::new(fs::read(path)?);
        (
            EntryContent::File(bytes),
            format!("Edited file {}", args.name),
        )
    } else {
        if args.file.is_some() {
            return Err(PassVaultError::EntryKindMismatch(args.name.to_string()));
        }
        let passphrase = prompt_passphrase()?;
        let master = manager.unlock(passphrase.as_bytes())?;
        let current = match manager.open_entry(&master, entry)? {
            EntryContent::Credential(credential) => credential,
            EntryContent::File(_) => {
                return Err(PassVaultError::EntryKindMismatch(args.name.to_string()));
            }
        };
        let credential = edited_credential(args, &current, &settings)?;
        (
            EntryContent::Credential(credential),
            format!("Regenerated password for site {}", args.name),
        )
    };

    manager.edit(args.name, &content)?;

    commit(&dir, &message);
    crate::audit::log_audit(
        &dir,
        "edit",
        Some(args.name),
        Some(if content.is_file() { "file" } else { "credential" }),
    );
    output::success(&format!("Updated '{}' under a new entry key", args.name));
    Ok(())
}

fn edited_credential(
    args: &EditArgs<'_>,
    current: &Credential,
    settings: &Settings,
) -> Result<Credential> {
    let password = match args.generate {
        Some(length) => Zeroizing::new(generator::generate(
            requested_length(length, settings),
            &CharClass::ALL,
        )?),
        None => read_entry_password(args.name)?,
    };

    let username = match args.username {
        Some(user) => non_empty(user.to_string()),
        None => current.username.clone(),
    };
    let notes = if args.notes.is_empty() {
        current.notes.clone()
    } else {
        args.notes.to_vec()
    };

    Ok(Credential {
        username,
        password: password.as_str().to_string(),
        notes,
    })
}
