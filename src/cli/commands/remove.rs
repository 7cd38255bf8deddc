//! `passvault remove` — delete an entry and its sealed file, if any.

use std::io::{self, IsTerminal};

use dialoguer::Confirm;

use crate::cli::commands::commit;
use crate::cli::output;
use crate::cli::{vault_dir, Cli};
use crate::errors::{PassVaultError, Result};
use crate::vault::VaultManager;

/// Execute the `remove` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let dir = vault_dir(cli)?;
    let mut manager = VaultManager::open(&dir)?;

    if manager.find_one(name).is_none() {
        return Err(PassVaultError::EntryNotFound(name.to_string()));
    }

    // Unless --force is set, ask for confirmation on a terminal.
    if !force && io::stdin().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove '{name}'?"))
            .default(false)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    manager.remove(name)?;

    commit(&dir, &format!("Removed site {name}"));
    crate::audit::log_audit(&dir, "remove", Some(name), None);
    output::success(&format!(
        "Removed '{name}' ({} left)",
        manager.store().len()
    ));
    Ok(())
}
