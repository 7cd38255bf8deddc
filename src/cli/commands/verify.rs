//! `passvault verify` — run both tripwires against the vault on disk.
//!
//! Inserts, edits and removals do not need the passphrase, so they leave
//! the vault HMAC behind the record until the next `integrity` or `push`.
//! Checking such a vault would look exactly like tampering, so `verify`
//! only runs when git shows the record is still at a baseline.

use crate::cli::output;
use crate::cli::{prompt_passphrase, vault_dir, Cli};
use crate::errors::{PassVaultError, Result};
use crate::git;
use crate::vault::VaultManager;

/// Execute the `verify` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;
    let manager = VaultManager::open(&dir)?;

    if !git::at_baseline(&dir)? {
        if git::is_repo(&dir) {
            output::tip("Run `passvault integrity` to baseline your own changes first.");
        } else {
            output::tip("Only a synced vault can be verified; run `passvault remote <URL>` first.");
        }
        return Err(PassVaultError::InvalidInput(
            "the vault may have changed since its last integrity baseline".into(),
        ));
    }

    // A wrong passphrase must fail here, before it can look like tampering.
    let passphrase = prompt_passphrase()?;
    manager.unlock(passphrase.as_bytes())?;
    manager.verify_after_sync(passphrase.as_bytes())?;

    crate::audit::log_audit(&dir, "verify", None, Some("both tripwires hold"));
    output::success("Master public key and vault record are intact.");
    Ok(())
}
