//! `passvault insert` — seal a new credential or file into the vault.
//!
//! Only the master public key is needed, so no passphrase is asked for.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::commands::{commit, requested_length};
use crate::cli::output;
use crate::cli::{non_empty, prompt_optional, read_entry_password, vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::generator::{self, CharClass};
use crate::vault::entry::validate_name;
use crate::vault::{Credential, VaultManager};

/// Arguments of `insert`, straight from the parser.
pub struct InsertArgs<'a> {
    pub name: &'a str,
    pub file: Option<&'a Path>,
    pub generate: Option<Option<i64>>,
    pub username: Option<&'a str>,
    pub notes: &'a [String],
}

/// Execute the `insert` command.
pub fn execute(cli: &Cli, args: &InsertArgs<'_>) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let mut manager = VaultManager::open(&dir)?;

    // Fail on a bad or taken name before prompting for anything.
    validate_name(args.name)?;
    if manager.store().contains(args.name) {
        return Err(PassVaultError::DuplicateName(args.name.to_string()));
    }

    let detail = match args.file {
        Some(path) => {
            let bytes = Zeroizing::new(fs::read(path)?);
            manager.insert_file(args.name, &bytes)?;
            output::success(&format!(
                "Sealed {} ({} bytes) as '{}'",
                path.display(),
                bytes.len(),
                args.name
            ));
            "file"
        }
        None => {
            let credential = build_credential(args, &settings)?;
            manager.insert_credential(args.name, &credential)?;
            output::success(&format!(
                "Inserted '{}' ({} total)",
                args.name,
                manager.store().len()
            ));
            "credential"
        }
    };

    commit(&dir, &format!("Inserted site {}", args.name));
    crate::audit::log_audit(&dir, "insert", Some(args.name), Some(detail));

    if args.generate.is_some() {
        output::tip(&format!("Run `passvault show {} --copy` to use it.", args.name));
    }
    Ok(())
}

fn build_credential(args: &InsertArgs<'_>, settings: &Settings) -> Result<Credential> {
    let username = match args.username {
        Some(user) => non_empty(user.to_string()),
        None => prompt_optional("Username (optional)")?,
    };

    let password = match args.generate {
        Some(length) => Zeroizing::new(generator::generate(
            requested_length(length, settings),
            &CharClass::ALL,
        )?),
        None => read_entry_password(args.name)?,
    };

    Ok(Credential {
        username,
        password: password.as_str().to_string(),
        notes: args.notes.to_vec(),
    })
}
