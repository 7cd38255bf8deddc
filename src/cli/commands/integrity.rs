//! `passvault integrity` — re-baseline the vault HMAC over the current
//! vault record and commit it.

use crate::cli::commands::commit;
use crate::cli::output;
use crate::cli::{prompt_passphrase, vault_dir, Cli};
use crate::errors::Result;
use crate::git;
use crate::vault::VaultManager;

/// Execute the `integrity` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;
    let mut manager = VaultManager::open(&dir)?;

    let passphrase = prompt_passphrase()?;
    manager.refresh_integrity(passphrase.as_bytes())?;

    commit(&dir, git::INTEGRITY_COMMIT);
    crate::audit::log_audit(&dir, "integrity", None, Some("vault HMAC refreshed"));
    output::success("Integrity hash updated.");
    Ok(())
}
