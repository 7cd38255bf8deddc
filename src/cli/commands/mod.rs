//! One module per subcommand, plus the small pieces they share.

pub mod audit_cmd;
pub mod completions;
pub mod edit;
pub mod generate;
pub mod init;
pub mod insert;
pub mod integrity;
pub mod list;
pub mod remove;
pub mod rename;
pub mod show;
pub mod sync;
pub mod verify;

use std::path::Path;

use tracing::warn;

use crate::cli::output;
use crate::config::Settings;
use crate::errors::PassVaultError;

/// Commit the vault directory after a mutation.
///
/// Best effort: the local change already happened, so a git failure is
/// reported as a warning and never fails the command.
pub(crate) fn commit(dir: &Path, message: &str) {
    if let Err(e) = crate::git::commit(dir, message) {
        warn!("commit '{message}' failed: {e}");
        output::warning(&format!("Could not commit the change: {e}"));
    }
}

/// The length to ask the generator for: the explicit one, else the
/// configured default.
pub(crate) fn requested_length(explicit: Option<i64>, settings: &Settings) -> i64 {
    explicit.unwrap_or_else(|| i64::try_from(settings.default_password_length).unwrap_or(i64::MAX))
}

/// Record a tripwire trip in the audit log.  Other failures are not
/// recorded.
pub fn record_failure(vault_dir: &Path, err: &PassVaultError) {
    match err {
        PassVaultError::IntegrityViolation(tripwire) => {
            crate::audit::log_audit(vault_dir, "tripwire", None, Some(&tripwire.to_string()));
        }
        PassVaultError::TripwireActive(_) => {
            crate::audit::log_audit(vault_dir, "tripwire", None, Some("refused: marker present"));
        }
        _ => {}
    }
}

/// Hint printed after a tripwire error so the user knows where to look.
pub fn tripwire_hint(vault_dir: &Path, err: &PassVaultError) {
    if matches!(
        err,
        PassVaultError::IntegrityViolation(_) | PassVaultError::TripwireActive(_)
    ) {
        if let Some(reason) = crate::integrity::tripwire_reason(vault_dir) {
            output::info(&format!("Tripwire: {reason}"));
        }
        output::tip("Inspect the vault history, then delete the TRIPWIRE file by hand.");
    }
}
