//! `passvault init` — create a new vault and, when git is around, a
//! repository for it.

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::git;
use crate::vault::{format, VaultManager};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;

    // 1. Refuse to overwrite an existing vault before asking anything.
    if format::config_path(&dir).exists() {
        output::tip("Use `passvault insert <NAME>` to add entries to the existing vault.");
        return Err(PassVaultError::VaultAlreadyExists(dir));
    }

    // 2. Settings may already sit in the directory to tune Argon2.
    let settings = Settings::load(&dir)?;

    // 3. Prompt for the master passphrase (with confirmation).
    let passphrase = prompt_new_passphrase()?;

    // 4. Create the identity and the empty vault record.
    VaultManager::init(&dir, passphrase.as_bytes(), &settings.argon2_params())?;
    output::success(&format!("Vault created at {}", dir.display()));

    // 5. Put the vault under version control for sync.
    if git::git_available() {
        match git::init_repo(&dir, &settings.git_branch) {
            Ok(()) => output::info("Initialized a git repository for sync."),
            Err(e) => output::warning(&format!("Could not set up git sync: {e}")),
        }
    } else {
        output::warning("git not found; sync commands will be unavailable.");
    }

    // 6. Audit log.
    crate::audit::log_audit(&dir, "init", None, Some("vault created"));

    // 7. Show helpful tips.
    output::tip("Run `passvault insert <NAME>` to add a credential.");
    output::tip("Run `passvault remote <URL>` to set up a sync remote.");

    Ok(())
}
