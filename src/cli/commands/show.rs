//! `passvault show` — open one entry and print it, copy its password, or
//! write out a sealed file.

use std::path::Path;

use crate::cli::output::{self, PasswordDisplay};
use crate::cli::{prompt_passphrase, vault_dir, Cli};
use crate::errors::{PassVaultError, Result};
use crate::vault::{OpenedFields, Query, VaultManager};

/// Execute the `show` command.
pub fn execute(cli: &Cli, name: &str, copy: bool, out: Option<&Path>) -> Result<()> {
    let dir = vault_dir(cli)?;
    let manager = VaultManager::open(&dir)?;

    // Look the entry up before asking for the passphrase.
    let entry = manager
        .select(&Query::One(name.to_string()))
        .into_iter()
        .next()
        .ok_or_else(|| PassVaultError::EntryNotFound(name.to_string()))?;
    check_flags(entry.is_file(), copy, out.is_some())?;

    let passphrase = prompt_passphrase()?;
    let master = manager.unlock(passphrase.as_bytes())?;
    let opened = manager.open_fields(&master, entry);

    let display = if copy {
        copy_password(&opened.fields)?;
        PasswordDisplay::Clipboard
    } else {
        PasswordDisplay::Plain
    };
    output::print_entry(&opened, display);

    match (&opened.fields, out) {
        (OpenedFields::File { content: Ok(bytes), .. }, Some(path)) => {
            write_private_file(path, bytes)?;
            output::success(&format!("Wrote {} bytes to {}", bytes.len(), path.display()));
        }
        (OpenedFields::File { content: Err(_), .. }, Some(_)) => {
            return Err(PassVaultError::DecryptionFailed);
        }
        (OpenedFields::File { .. }, None) => {
            output::tip(&format!("Run `passvault show {name} --out <PATH>` to write the file."));
        }
        (OpenedFields::Credential { .. }, _) => {}
    }
    Ok(())
}

/// Refuse flags that do not fit the entry kind, before anything is opened.
fn check_flags(is_file: bool, copy: bool, out: bool) -> Result<()> {
    if is_file && copy {
        return Err(PassVaultError::InvalidInput(
            "--copy only works for credential entries".into(),
        ));
    }
    if !is_file && out {
        return Err(PassVaultError::InvalidInput(
            "--out only works for file entries".into(),
        ));
    }
    Ok(())
}

fn copy_password(fields: &OpenedFields) -> Result<()> {
    let password = match fields {
        OpenedFields::Credential {
            password: Ok(password),
            ..
        } => password,
        OpenedFields::Credential { password: Err(_), .. } => {
            return Err(PassVaultError::DecryptionFailed);
        }
        OpenedFields::File { .. } => {
            return Err(PassVaultError::InvalidInput(
                "--copy only works for credential entries".into(),
            ));
        }
    };

    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| PassVaultError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(password.as_str())
        .map_err(|e| PassVaultError::CommandFailed(format!("could not copy to clipboard: {e}")))?;
    output::success("Password copied to the clipboard.");
    Ok(())
}

/// Write `bytes` to `path`, readable by the owner only on Unix.
fn write_private_file(path: &Path, bytes: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(bytes)?;
    }

    #[cfg(not(unix))]
    std::fs::write(path, bytes)?;

    Ok(())
}
