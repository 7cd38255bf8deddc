use clap::Parser;
use tracing_subscriber::EnvFilter;

use passvault::cli::commands::edit::EditArgs;
use passvault::cli::commands::generate::ClassFlags;
use passvault::cli::commands::insert::InsertArgs;
use passvault::cli::commands::{self, record_failure, tripwire_hint};
use passvault::cli::{output, vault_dir, Cli, Commands};

fn main() {
    // Diagnostics go to stderr, filtered by PASSVAULT_LOG (default: warn).
    let filter = EnvFilter::try_from_env("PASSVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None | Some(Commands::List) => commands::list::execute(&cli),
        Some(Commands::Init) => commands::init::execute(&cli),
        Some(Commands::Insert {
            ref name,
            ref file,
            generate,
            ref username,
            ref notes,
        }) => commands::insert::execute(
            &cli,
            &InsertArgs {
                name,
                file: file.as_deref(),
                generate,
                username: username.as_deref(),
                notes,
            },
        ),
        Some(Commands::Show {
            ref name,
            copy,
            ref out,
        }) => commands::show::execute(&cli, name, copy, out.as_deref()),
        Some(Commands::Find { ref fragment }) => commands::list::execute_find(&cli, fragment),
        Some(Commands::Edit {
            ref name,
            ref file,
            generate,
            ref username,
            ref notes,
        }) => commands::edit::execute(
            &cli,
            &EditArgs {
                name,
                file: file.as_deref(),
                generate,
                username: username.as_deref(),
                notes,
            },
        ),
        Some(Commands::Rename {
            ref name,
            ref new_name,
        }) => commands::rename::execute(&cli, name, new_name),
        Some(Commands::Remove { ref name, force }) => commands::remove::execute(&cli, name, force),
        Some(Commands::Generate {
            length,
            no_upper,
            no_lower,
            no_digit,
            no_symbol,
        }) => commands::generate::execute(
            &cli,
            length,
            ClassFlags {
                no_upper,
                no_lower,
                no_digit,
                no_symbol,
            },
        ),
        Some(Commands::Integrity) => commands::integrity::execute(&cli),
        Some(Commands::Verify) => commands::verify::execute(&cli),
        Some(Commands::Pull) => commands::sync::execute_pull(&cli),
        Some(Commands::Push) => commands::sync::execute_push(&cli),
        Some(Commands::Remote { ref url }) => commands::sync::execute_remote(&cli, url),
        Some(Commands::Clone { ref url }) => commands::sync::execute_clone(&cli, url),
        Some(Commands::Audit { last }) => commands::audit_cmd::execute(&cli, last),
        Some(Commands::Completions { shell }) => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if let Ok(dir) = vault_dir(&cli) {
            record_failure(&dir, &e);
            tripwire_hint(&dir, &e);
        }
        std::process::exit(1);
    }
}
