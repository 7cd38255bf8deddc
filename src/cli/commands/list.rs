//! `passvault list` and `passvault find` — print entry names as a tree.
//!
//! Names are stored in the clear, so neither command needs the passphrase.

use crate::cli::output;
use crate::cli::{vault_dir, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::{Query, VaultManager};

/// Execute the `list` command (also run when no subcommand is given).
pub fn execute(cli: &Cli) -> Result<()> {
    print_query(cli, &Query::All)
}

/// Execute the `find` command.
pub fn execute_find(cli: &Cli, fragment: &str) -> Result<()> {
    print_query(cli, &Query::Search(fragment.to_string()))
}

fn print_query(cli: &Cli, query: &Query) -> Result<()> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let manager = VaultManager::open(&dir)?;

    let groups = manager.query(query);
    output::print_tree(&groups, settings.tree_glyphs());
    Ok(())
}
