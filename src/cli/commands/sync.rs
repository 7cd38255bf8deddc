//! `passvault pull`, `push`, `remote` and `clone` — git sync with the
//! integrity tripwires run on everything that arrives.
//!
//! The remote is untrusted.  The passphrase is always checked against the
//! local state first, so a mistyped passphrase is reported as such and
//! never mistaken for tampering.

use crate::cli::output;
use crate::cli::{prompt_passphrase, vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::git;
use crate::vault::VaultManager;

/// Execute the `pull` command.
pub fn execute_pull(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    require_repo(&dir)?;

    // 1. Validate the passphrase against the pre-pull identity.
    let passphrase = prompt_passphrase()?;
    let mut local = VaultManager::open(&dir)?;
    local.unlock(passphrase.as_bytes())?;

    // 2. Baseline local changes so they are not taken for tampering.
    if !git::at_baseline(&dir)? {
        local.refresh_integrity(passphrase.as_bytes())?;
        git::commit(&dir, git::INTEGRITY_COMMIT)?;
    }

    // 3. Pull, then reload and check what arrived.
    git::pull(&dir, &settings.git_remote, &settings.git_branch)?;
    let manager = VaultManager::open(&dir)?;
    manager.verify_after_sync(passphrase.as_bytes())?;

    crate::audit::log_audit(&dir, "pull", None, Some(&settings.git_remote));
    output::success(&format!(
        "Pulled from {} and verified ({} entries)",
        settings.git_remote,
        manager.store().len()
    ));
    Ok(())
}

/// Execute the `push` command.
pub fn execute_push(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    require_repo(&dir)?;

    let mut manager = VaultManager::open(&dir)?;
    let passphrase = prompt_passphrase()?;
    manager.refresh_integrity(passphrase.as_bytes())?;

    git::commit(&dir, git::INTEGRITY_COMMIT)?;
    git::push(&dir, &settings.git_remote, &settings.git_branch)?;

    crate::audit::log_audit(&dir, "push", None, Some(&settings.git_remote));
    output::success(&format!("Pushed to {}", settings.git_remote));
    Ok(())
}

/// Execute the `remote` command.
pub fn execute_remote(cli: &Cli, url: &str) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;

    // The vault has to exist; an untracked one is baselined and put under
    // git first, since the initial commit counts as a baseline.
    let mut manager = VaultManager::open(&dir)?;
    if !git::is_repo(&dir) {
        let passphrase = prompt_passphrase()?;
        manager.refresh_integrity(passphrase.as_bytes())?;
        git::init_repo(&dir, &settings.git_branch)?;
        output::info("Initialized a git repository for sync.");
    }

    git::set_remote(&dir, &settings.git_remote, url)?;
    output::success(&format!("Remote {} now points at {url}", settings.git_remote));
    output::tip("Run `passvault push` to upload the vault.");
    Ok(())
}

/// Execute the `clone` command.
pub fn execute_clone(cli: &Cli, url: &str) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::default();

    git::clone(url, &dir, &settings.git_remote)?;
    output::info(&format!("Cloned {url} into {}", dir.display()));

    let manager = VaultManager::open(&dir)?;
    let passphrase = prompt_passphrase()?;
    manager.unlock(passphrase.as_bytes())?;
    manager.verify_after_sync(passphrase.as_bytes())?;

    crate::audit::log_audit(&dir, "clone", None, Some(url));
    output::success(&format!(
        "Vault cloned and verified ({} entries)",
        manager.store().len()
    ));
    Ok(())
}

fn require_repo(dir: &std::path::Path) -> Result<()> {
    if !git::is_repo(dir) {
        return Err(PassVaultError::SyncFailed(format!(
            "{} is not a git repository; run `passvault remote <URL>` first",
            dir.display()
        )));
    }
    Ok(())
}
