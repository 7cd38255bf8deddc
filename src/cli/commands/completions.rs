//! `passvault completions` — print a shell completion script.
//!
//!   passvault completions bash > ~/.local/share/bash-completion/completions/passvault
//!   passvault completions zsh > "${fpath[1]}/_passvault"

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Render the completion script for `shell` into `out`.
fn write_script(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_script(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bash_script_covers_vault_commands() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("passvault"));
        assert!(bash.contains("insert"));
        assert!(bash.contains("integrity"));
    }

    #[test]
    fn every_shell_renders_something() {
        for shell in [
            Shell::Bash,
            Shell::Zsh,
            Shell::Fish,
            Shell::PowerShell,
            Shell::Elvish,
        ] {
            assert!(!script(shell).is_empty(), "{shell:?}");
        }
    }

    #[test]
    fn unknown_shell_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["passvault", "completions", "csh"]).is_err());
        assert!(Cli::try_parse_from(["passvault", "completions", "fish"]).is_ok());
    }
}
