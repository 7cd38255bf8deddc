//! Git sync — a thin wrapper around the `git` executable.
//!
//! The vault directory doubles as a git work tree.  Every mutation is
//! committed, and `pull`/`push` move the records through a remote.  The
//! remote is untrusted: callers run the integrity tripwires after every
//! pull or clone.  Local-only files (audit log, tripwire marker, temp
//! files) are kept out of the repository by a `.gitignore`.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::errors::{PassVaultError, Result};

/// Message of the commit made before every push.
pub const INTEGRITY_COMMIT: &str = "Updated integrity hash";

/// Message of the first commit of a new vault.
pub const INITIAL_COMMIT: &str = "Initialized vault";

const GITIGNORE: &str = "\
# passvault: local-only files
audit.db
TRIPWIRE
settings.toml
.*.tmp
files/.*.removed
";

/// Run `git <args>` inside `dir` and return its stdout.
fn run(dir: &Path, args: &[&str]) -> Result<String> {
    debug!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| PassVaultError::SyncFailed(format!("could not run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PassVaultError::SyncFailed(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether `git` can be executed at all.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether `dir` is the top of a git work tree.
pub fn is_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Turn a fresh vault directory into a repository with one commit on
/// `branch`.
pub fn init_repo(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["init", "--quiet"])?;
    let head = format!("refs/heads/{branch}");
    run(dir, &["symbolic-ref", "HEAD", head.as_str()])?;
    fs::write(dir.join(".gitignore"), GITIGNORE)?;
    run(dir, &["add", "--all"])?;
    commit_staged(dir, INITIAL_COMMIT)
}

/// Stage everything and commit with `message`.
///
/// Returns `false` without touching anything when `dir` is not a
/// repository or nothing changed.
pub fn commit(dir: &Path, message: &str) -> Result<bool> {
    if !is_repo(dir) {
        return Ok(false);
    }
    run(dir, &["add", "--all"])?;
    if run(dir, &["status", "--porcelain"])?.trim().is_empty() {
        return Ok(false);
    }
    commit_staged(dir, message)?;
    Ok(true)
}

fn commit_staged(dir: &Path, message: &str) -> Result<()> {
    // Fall back to a local identity so commits work on machines where git
    // has never been configured.
    let has_identity = run(dir, &["config", "user.email"])
        .map(|email| !email.trim().is_empty())
        .unwrap_or(false);

    if has_identity {
        run(dir, &["commit", "--quiet", "-m", message])?;
    } else {
        run(
            dir,
            &[
                "-c",
                "user.name=passvault",
                "-c",
                "user.email=passvault@localhost",
                "commit",
                "--quiet",
                "-m",
                message,
            ],
        )?;
    }
    Ok(())
}

/// Whether the vault HMAC provably covers the work tree: the tree is
/// clean and the newest commit is the initial or an integrity commit.
///
/// Outside a repository, or in one without commits, nothing proves it.
pub fn at_baseline(dir: &Path) -> Result<bool> {
    if !is_repo(dir) {
        return Ok(false);
    }
    if !run(dir, &["status", "--porcelain"])?.trim().is_empty() {
        return Ok(false);
    }
    let Ok(subject) = run(dir, &["log", "-1", "--format=%s"]) else {
        return Ok(false);
    };
    let subject = subject.trim();
    Ok(subject == INTEGRITY_COMMIT || subject == INITIAL_COMMIT)
}

/// Point `remote` at `url`, replacing any previous URL.
pub fn set_remote(dir: &Path, remote: &str, url: &str) -> Result<()> {
    if !is_repo(dir) {
        return Err(PassVaultError::SyncFailed(format!(
            "{} is not a git repository",
            dir.display()
        )));
    }
    // Fails when the remote does not exist yet, which is fine.
    let _ = run(dir, &["remote", "remove", remote]);
    run(dir, &["remote", "add", remote, url])?;
    Ok(())
}

pub fn pull(dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(dir, &["pull", "--quiet", remote, branch])?;
    Ok(())
}

pub fn push(dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(dir, &["push", "--quiet", "-u", remote, branch])?;
    Ok(())
}

/// Clone `url` into `dir`, naming the remote `remote`.
pub fn clone(url: &str, dir: &Path, remote: &str) -> Result<()> {
    if dir.exists() && fs::read_dir(dir)?.next().is_some() {
        return Err(PassVaultError::VaultAlreadyExists(dir.to_path_buf()));
    }
    let parent = dir.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let target = dir.to_string_lossy();
    run(
        parent,
        &["clone", "--quiet", "--origin", remote, url, target.as_ref()],
    )?;
    Ok(())
}
