//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::config::TreeGlyphs;
use crate::vault::{Group, OpenedEntry, OpenedFields};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Render grouped entries as a tree: a count line, then one line per
/// group and one per leaf.  A singleton group is drawn as a single line.
pub fn render_tree(groups: &[Group<'_>], glyphs: TreeGlyphs) -> String {
    const INDENT: &str = "   ";

    let total: usize = groups.iter().map(|g| g.entries.len()).sum();
    let mut out = format!("  {total}\n");

    for (i, group) in groups.iter().enumerate() {
        let last_group = i + 1 == groups.len();
        let (group_prefix, inner) = if last_group {
            (glyphs.last, glyphs.inner_last)
        } else {
            (glyphs.branch, glyphs.inner)
        };

        out.push_str(&format!("{INDENT}{group_prefix}{}\n", group.label()));
        if group.name.is_none() {
            continue;
        }

        for (j, entry) in group.entries.iter().enumerate() {
            let leaf_prefix = if j + 1 == group.entries.len() {
                glyphs.last
            } else {
                glyphs.branch
            };
            out.push_str(&format!("{INDENT}{inner}{leaf_prefix}{}\n", entry.leaf()));
        }
    }
    out
}

/// Print the entry tree, or a hint when there is nothing to show.
pub fn print_tree(groups: &[Group<'_>], glyphs: TreeGlyphs) {
    if groups.is_empty() {
        info("No entries to show.");
        tip("Run `passvault insert <NAME>` to add your first entry.");
        return;
    }
    print!("{}", render_tree(groups, glyphs));
}

/// How the password of a shown credential is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordDisplay {
    Plain,
    Clipboard,
}

/// Build the table for one opened entry.  Fields that failed to open are
/// shown as unavailable; the caller has already logged why.
pub fn entry_table(opened: &OpenedEntry, password: PasswordDisplay) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Name".to_string(), opened.name.clone()]);

    match &opened.fields {
        OpenedFields::Credential {
            username,
            password: pass,
            notes,
        } => {
            let user = match username {
                None => "-".to_string(),
                Some(Ok(user)) => user.clone(),
                Some(Err(_)) => unavailable(),
            };
            table.add_row(vec!["Username".to_string(), user]);

            let pass = match (pass, password) {
                (Err(_), _) => unavailable(),
                (Ok(_), PasswordDisplay::Clipboard) => "@ clipboard".to_string(),
                (Ok(p), PasswordDisplay::Plain) => p.as_str().to_string(),
            };
            table.add_row(vec!["Password".to_string(), pass]);

            for note in notes {
                let text = match note {
                    Ok(text) => text.clone(),
                    Err(_) => unavailable(),
                };
                table.add_row(vec!["Note".to_string(), text]);
            }
        }
        OpenedFields::File { token, content } => {
            let size = match content {
                Ok(bytes) => format!("{} bytes", bytes.len()),
                Err(_) => unavailable(),
            };
            table.add_row(vec!["File".to_string(), token.clone()]);
            table.add_row(vec!["Size".to_string(), size]);
        }
    }
    table
}

fn unavailable() -> String {
    style("<could not decrypt>").red().to_string()
}

/// Print the table for one opened entry.
pub fn print_entry(opened: &OpenedEntry, password: PasswordDisplay) {
    println!("{}", entry_table(opened, password));
}
