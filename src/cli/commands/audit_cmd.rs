//! `passvault audit` — display the audit log.
//!
//! Usage:
//!   passvault audit               # show last 50 entries
//!   passvault audit --last 20     # show last 20

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{self, AuditEntry};
use crate::cli::output;
use crate::cli::{vault_dir, Cli};
use crate::errors::Result;

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize) -> Result<()> {
    let dir = vault_dir(cli)?;
    let entries = audit::recent(&dir, last)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{}", audit_table(&entries));
    Ok(())
}

/// Audit entries in a formatted table.
pub fn audit_table(entries: &[AuditEntry]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Entry", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let name = entry.entry_name.as_deref().unwrap_or("-");
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![
            time,
            colorize_operation(&entry.operation),
            name.to_string(),
            details.to_string(),
        ]);
    }
    table
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    match op {
        "init" | "clone" => style(op).green().to_string(),
        "insert" | "edit" | "rename" => style(op).blue().to_string(),
        "remove" => style(op).red().to_string(),
        "tripwire" => style(op).red().bold().to_string(),
        "integrity" | "verify" => style(op).yellow().to_string(),
        "pull" | "push" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
