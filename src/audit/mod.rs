//! Audit log — SQLite-based operation history.
//!
//! Stores a record of every vault operation (insert, edit, rename,
//! tripwire trips, ...) in a local SQLite database at
//! `<vault_dir>/audit.db`.  Secrets are never written here, only entry
//! names.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.  Built
//! without the `audit-log` feature, every call is a no-op.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::Result;

/// File name of the audit database inside the vault directory.
pub const DB_FILE: &str = "audit.db";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub entry_name: Option<String>,
    pub details: Option<String>,
}

/// Return the path to the audit database.
pub fn db_path(vault_dir: &Path) -> PathBuf {
    vault_dir.join(DB_FILE)
}

#[cfg(feature = "audit-log")]
pub use sqlite::AuditLog;

#[cfg(not(feature = "audit-log"))]
pub use disabled::AuditLog;

#[cfg(feature = "audit-log")]
mod sqlite {
    use std::path::Path;

    use chrono::{DateTime, Utc};
    use rusqlite::Connection;

    use super::{db_path, AuditEntry};
    use crate::errors::{PassVaultError, Result};

    /// SQLite-backed audit log.
    pub struct AuditLog {
        conn: Connection,
    }

    impl AuditLog {
        /// Open (or create) the audit database at `<vault_dir>/audit.db`.
        ///
        /// Returns `None` if the database can't be opened — callers should
        /// treat this as "audit logging unavailable" and continue normally.
        pub fn open(vault_dir: &Path) -> Option<Self> {
            let path = db_path(vault_dir);
            let conn = Connection::open(&path).ok()?;

            // Owner-only, like the rest of the vault directory.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                let _ = std::fs::set_permissions(&path, perms);
            }

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS audit_log (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp   TEXT NOT NULL,
                    operation   TEXT NOT NULL,
                    entry_name  TEXT,
                    details     TEXT
                );",
            )
            .ok()?;

            Some(Self { conn })
        }

        /// Record an operation. Fire-and-forget — errors are silently ignored.
        pub fn log(&self, operation: &str, entry_name: Option<&str>, details: Option<&str>) {
            let now = Utc::now().to_rfc3339();
            let _ = self.conn.execute(
                "INSERT INTO audit_log (timestamp, operation, entry_name, details)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![now, operation, entry_name, details],
            );
        }

        /// The most recent `limit` entries, newest first.
        pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);

            let mut stmt = self
                .conn
                .prepare(
                    "SELECT id, timestamp, operation, entry_name, details
                     FROM audit_log
                     ORDER BY id DESC
                     LIMIT ?1",
                )
                .map_err(|e| PassVaultError::AuditError(format!("query prepare: {e}")))?;

            let rows = stmt
                .query_map([limit], |row| {
                    let ts: String = row.get(1)?;
                    let timestamp = DateTime::parse_from_rfc3339(&ts)
                        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                    Ok(AuditEntry {
                        id: row.get(0)?,
                        timestamp,
                        operation: row.get(2)?,
                        entry_name: row.get(3)?,
                        details: row.get(4)?,
                    })
                })
                .map_err(|e| PassVaultError::AuditError(format!("query exec: {e}")))?;

            rows.map(|row| row.map_err(|e| PassVaultError::AuditError(format!("row parse: {e}"))))
                .collect()
        }
    }
}

#[cfg(not(feature = "audit-log"))]
mod disabled {
    use std::path::Path;

    use super::AuditEntry;
    use crate::errors::Result;

    /// Stand-in used when the crate is built without `audit-log`.
    pub struct AuditLog;

    impl AuditLog {
        pub fn open(_vault_dir: &Path) -> Option<Self> {
            None
        }

        pub fn log(&self, _operation: &str, _entry_name: Option<&str>, _details: Option<&str>) {}

        pub fn recent(&self, _limit: usize) -> Result<Vec<AuditEntry>> {
            Ok(Vec::new())
        }
    }
}

/// Convenience helper: log an audit event for a vault directory.
///
/// Opens the audit database, logs the event, and silently ignores any errors.
/// This is safe to call from any command — it never fails the parent operation.
pub fn log_audit(vault_dir: &Path, operation: &str, entry_name: Option<&str>, details: Option<&str>) {
    if let Some(audit) = AuditLog::open(vault_dir) {
        audit.log(operation, entry_name, details);
    }
}

/// Read the last `limit` events, or an empty list when there is no log.
pub fn recent(vault_dir: &Path, limit: usize) -> Result<Vec<AuditEntry>> {
    if !db_path(vault_dir).exists() {
        return Ok(Vec::new());
    }
    match AuditLog::open(vault_dir) {
        Some(audit) => audit.recent(limit),
        None => Ok(Vec::new()),
    }
}

#[cfg(all(test, feature = "audit-log"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path());
        assert!(audit.is_some(), "should open successfully");
        assert!(dir.path().join("audit.db").exists());
    }

    #[test]
    fn log_and_query_roundtrip() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("insert", Some("bank.com"), Some("credential"));
        audit.log("insert", Some("work/vpn"), Some("credential"));
        audit.log("remove", Some("old"), None);

        let entries = audit.recent(10).unwrap();
        assert_eq!(entries.len(), 3);

        // Most recent first.
        assert_eq!(entries[0].operation, "remove");
        assert_eq!(entries[1].operation, "insert");
        assert_eq!(entries[2].entry_name.as_deref(), Some("bank.com"));
    }

    #[test]
    fn recent_respects_limit() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        for i in 0..10 {
            audit.log("insert", Some(&format!("site{i}")), None);
        }

        let entries = audit.recent(3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].entry_name.as_deref(), Some("site9"));
    }

    #[test]
    fn log_records_details() {
        let dir = TempDir::new().unwrap();
        log_audit(dir.path(), "init", None, Some("vault created"));

        let entries = recent(dir.path(), 1).unwrap();
        assert_eq!(entries[0].operation, "init");
        assert!(entries[0].entry_name.is_none());
        assert_eq!(entries[0].details.as_deref(), Some("vault created"));
    }

    #[test]
    fn recent_without_database_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(recent(dir.path(), 5).unwrap().is_empty());
        assert!(!db_path(dir.path()).exists());
    }

    #[test]
    fn open_returns_none_on_bad_path() {
        // A path that doesn't exist as a directory should fail gracefully.
        let result = AuditLog::open(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let _audit = AuditLog::open(dir.path()).unwrap();

        let perms = std::fs::metadata(db_path(dir.path())).unwrap().permissions();
        assert_eq!(
            perms.mode() & 0o777,
            0o600,
            "audit.db should have 0o600 permissions"
        );
    }
}
