//! `passvault generate` — print a random password without storing it.

use crate::cli::commands::requested_length;
use crate::cli::{vault_dir, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::generator::{self, CharClass};

/// Which classes the password must contain, from the `--no-*` flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFlags {
    pub no_upper: bool,
    pub no_lower: bool,
    pub no_digit: bool,
    pub no_symbol: bool,
}

impl ClassFlags {
    pub fn required(self) -> Vec<CharClass> {
        CharClass::ALL
            .into_iter()
            .filter(|class| match class {
                CharClass::Upper => !self.no_upper,
                CharClass::Lower => !self.no_lower,
                CharClass::Digit => !self.no_digit,
                CharClass::Symbol => !self.no_symbol,
            })
            .collect()
    }
}

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<i64>, flags: ClassFlags) -> Result<()> {
    // Settings are optional here; without a vault directory use defaults.
    let settings = match vault_dir(cli) {
        Ok(dir) => Settings::load(&dir)?,
        Err(_) => Settings::default(),
    };

    let password = zeroize::Zeroizing::new(generator::generate(
        requested_length(length, &settings),
        &flags.required(),
    )?);
    println!("{}", password.as_str());
    Ok(())
}
