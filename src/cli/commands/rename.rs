//! `passvault rename` — move an entry to a new name.

use crate::cli::commands::commit;
use crate::cli::output;
use crate::cli::{prompt_passphrase, vault_dir, Cli};
use crate::errors::{PassVaultError, Result};
use crate::vault::entry::validate_name;
use crate::vault::VaultManager;

/// Execute the `rename` command.
pub fn execute(cli: &Cli, name: &str, new_name: &str) -> Result<()> {
    let dir = vault_dir(cli)?;
    let mut manager = VaultManager::open(&dir)?;

    if manager.find_one(name).is_none() {
        return Err(PassVaultError::EntryNotFound(name.to_string()));
    }
    validate_name(new_name)?;
    if name != new_name && manager.store().contains(new_name) {
        return Err(PassVaultError::DuplicateName(new_name.to_string()));
    }

    // Renaming re-seals the content, which has to be opened first.
    let passphrase = prompt_passphrase()?;
    let master = manager.unlock(passphrase.as_bytes())?;
    manager.rename(&master, name, new_name)?;

    commit(&dir, &format!("Renamed site {name} to {new_name}"));
    crate::audit::log_audit(&dir, "rename", Some(new_name), Some(&format!("from {name}")));
    output::success(&format!("Renamed '{name}' to '{new_name}'"));
    Ok(())
}
