//! CLI module — Clap argument parser, prompts, output helpers, and command
//! implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::errors::{PassVaultError, Result};

/// Minimum passphrase length to prevent trivially weak passphrases.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Environment variable holding the master passphrase for scripted use.
pub const PASSPHRASE_ENV: &str = "PASSVAULT_PASSWORD";

/// passvault: a local password vault with public-key sealed entries.
#[derive(Parser)]
#[command(
    name = "passvault",
    about = "Local password vault with per-entry sealing and sync tripwires",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Vault directory (default: ~/.passvault)
    #[arg(long, env = "PASSVAULT_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Add a credential or a file
    Insert {
        /// Entry name, optionally grouped (e.g. work/vpn)
        name: String,
        /// Seal the contents of this file instead of a credential
        #[arg(long, value_name = "PATH", conflicts_with_all = ["generate", "username", "notes"])]
        file: Option<PathBuf>,
        /// Generate the password, optionally with a length
        #[arg(long, value_name = "LEN", allow_negative_numbers = true)]
        generate: Option<Option<i64>>,
        /// Username (prompted for when omitted on a terminal)
        #[arg(short, long)]
        username: Option<String>,
        /// Free-form note; repeat for several
        #[arg(long = "note", value_name = "TEXT")]
        notes: Vec<String>,
    },

    /// Show one entry
    Show {
        /// Full entry name or leaf name
        name: String,
        /// Copy the password to the clipboard instead of printing it
        #[arg(short, long)]
        copy: bool,
        /// Write the contents of a file entry to this path
        #[arg(long, value_name = "PATH", conflicts_with = "copy")]
        out: Option<PathBuf>,
    },

    /// List entries whose name contains a fragment
    #[command(alias = "ls")]
    Find {
        /// Text to look for in entry names
        fragment: String,
    },

    /// List all entries
    List,

    /// Replace the content of an entry
    Edit {
        /// Entry name
        name: String,
        /// New file contents for a file entry
        #[arg(long, value_name = "PATH", conflicts_with_all = ["generate", "username", "notes"])]
        file: Option<PathBuf>,
        /// Generate the new password, optionally with a length
        #[arg(long, value_name = "LEN", allow_negative_numbers = true)]
        generate: Option<Option<i64>>,
        /// New username (kept when omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Replace the notes; repeat for several
        #[arg(long = "note", value_name = "TEXT")]
        notes: Vec<String>,
    },

    /// Rename an entry
    Rename {
        /// Current entry name
        name: String,
        /// New entry name
        new_name: String,
    },

    /// Delete an entry
    #[command(alias = "rm")]
    Remove {
        /// Entry name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Print a random password
    Generate {
        /// Password length (default from settings)
        #[arg(allow_negative_numbers = true)]
        length: Option<i64>,
        /// Do not require an uppercase letter
        #[arg(long)]
        no_upper: bool,
        /// Do not require a lowercase letter
        #[arg(long)]
        no_lower: bool,
        /// Do not require a digit
        #[arg(long)]
        no_digit: bool,
        /// Do not require a symbol
        #[arg(long)]
        no_symbol: bool,
    },

    /// Re-baseline the vault HMAC and commit it
    Integrity,

    /// Run both tripwire checks against the vault on disk
    Verify,

    /// Pull from the sync remote, then verify
    Pull,

    /// Refresh the integrity hash, commit, and push
    Push,

    /// Set the URL of the sync remote
    Remote {
        /// Remote repository URL or path
        url: String,
    },

    /// Clone a vault from a remote, then verify
    Clone {
        /// Remote repository URL or path
        url: String,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The vault directory the command should work on.
pub fn vault_dir(cli: &Cli) -> Result<PathBuf> {
    crate::config::resolve_vault_dir(cli.vault_dir.as_deref())
}

/// Get the master passphrase, trying in order:
/// 1. `PASSVAULT_PASSWORD` env var (scripts and tests)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master passphrase")
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master passphrase with confirmation (used during `init`).
///
/// Also respects `PASSVAULT_PASSWORD` and enforces a minimum length.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        if pw.chars().count() < MIN_PASSPHRASE_LEN {
            return Err(PassVaultError::InvalidInput(format!(
                "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let pw = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master passphrase")
                .with_confirmation(
                    "Confirm master passphrase",
                    "Passphrases do not match, try again",
                )
                .interact()
                .map_err(|e| PassVaultError::CommandFailed(format!("passphrase prompt: {e}")))?,
        );

        if pw.chars().count() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(pw);
    }
}

fn passphrase_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Read an entry password from one of two sources:
/// piped stdin (first line), or a hidden prompt with confirmation.
pub fn read_entry_password(name: &str) -> Result<Zeroizing<String>> {
    let pw = if io::stdin().is_terminal() {
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Password for {name}"))
                .with_confirmation("Confirm password", "Passwords do not match, try again")
                .interact()
                .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?,
        )
    } else {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.lines().next().unwrap_or_default().to_string())
    };

    if pw.is_empty() {
        return Err(PassVaultError::InvalidInput(format!(
            "the password for '{name}' cannot be empty"
        )));
    }
    Ok(pw)
}

/// Ask for an optional line of text.  Off a terminal nothing is asked and
/// `None` is returned.
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }
    let text: String = dialoguer::Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(non_empty(text))
}

/// `None` for blank text, the trimmed text otherwise.
pub fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["passvault"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn generate_flag_takes_optional_length() {
        let cli = Cli::try_parse_from(["passvault", "insert", "bank.com", "--generate"]).unwrap();
        match cli.command {
            Some(Commands::Insert { generate, .. }) => assert_eq!(generate, Some(None)),
            _ => panic!("expected insert"),
        }

        let cli =
            Cli::try_parse_from(["passvault", "insert", "bank.com", "--generate", "32"]).unwrap();
        match cli.command {
            Some(Commands::Insert { generate, .. }) => assert_eq!(generate, Some(Some(32))),
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn file_conflicts_with_credential_flags() {
        assert!(Cli::try_parse_from([
            "passvault",
            "insert",
            "keys/ssh",
            "--file",
            "id_ed25519",
            "--generate"
        ])
        .is_err());
    }

    #[test]
    fn notes_repeat() {
        let cli = Cli::try_parse_from([
            "passvault", "insert", "bank.com", "--note", "pin 1234", "--note", "branch 7",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Insert { notes, .. }) => assert_eq!(notes, ["pin 1234", "branch 7"]),
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn aliases_resolve() {
        assert!(matches!(
            Cli::try_parse_from(["passvault", "ls", "bank"]).unwrap().command,
            Some(Commands::Find { .. })
        ));
        assert!(matches!(
            Cli::try_parse_from(["passvault", "rm", "bank.com"]).unwrap().command,
            Some(Commands::Remove { .. })
        ));
    }

    #[test]
    fn generate_accepts_negative_length() {
        let cli = Cli::try_parse_from(["passvault", "generate", "-1"]).unwrap();
        match cli.command {
            Some(Commands::Generate { length, .. }) => assert_eq!(length, Some(-1)),
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn non_empty_trims_blank_text() {
        assert_eq!(non_empty("  ".into()), None);
        assert_eq!(non_empty(" alice ".into()), Some("alice".into()));
    }
}
